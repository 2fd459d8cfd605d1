use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use super::*;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, contents) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }
    dir
}

fn change(file: &str, action: CodeChangeAction, code: &[&str]) -> CodeChange {
    CodeChange {
        file: PathBuf::from(file),
        action,
        code_lines: code.iter().map(|line| line.to_string()).collect(),
    }
}

fn read(dir: &TempDir, file: &str) -> String {
    fs::read_to_string(dir.path().join(file)).unwrap()
}

#[test]
fn new_expands_directories_and_skips_hidden_entries() {
    let dir = project(&[
        ("src/main.py", "print(1)\n"),
        ("src/util/helpers.py", "x = 1\n"),
        ("src/.cache/blob.py", "ignored\n"),
        (".git/config", "ignored\n"),
        ("README.md", "readme\n"),
    ]);
    fs::write(dir.path().join("src/logo.bin"), [0xff, 0xfe, 0x00]).unwrap();

    let manager =
        CodeFileManager::new(dir.path(), &[PathBuf::from("src"), PathBuf::from("README.md")])
            .unwrap();

    assert_eq!(
        manager.files(),
        &[
            PathBuf::from("README.md"),
            PathBuf::from("src/main.py"),
            PathBuf::from("src/util/helpers.py"),
        ]
    );
}

#[test]
fn new_errors_on_missing_path() {
    let dir = project(&[]);
    let err = CodeFileManager::new(dir.path(), &[PathBuf::from("nope.py")]).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn code_message_numbers_lines() {
    let dir = project(&[("hello.py", "def main():\n    pass\n")]);
    let manager = CodeFileManager::new(dir.path(), &[PathBuf::from("hello.py")]).unwrap();

    assert_eq!(
        manager.code_message().unwrap(),
        "Code Files:\n\nhello.py\n1:def main():\n2:    pass\n\n"
    );
}

#[test]
fn apply_changes_edits_bottom_up() {
    let dir = project(&[("a.py", "one\ntwo\nthree\nfour\nfive\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("a.py")]).unwrap();

    manager
        .apply_changes(&[
            change("a.py", CodeChangeAction::Insert { after_line: 0 }, &["zero"]),
            change(
                "a.py",
                CodeChangeAction::Replace {
                    start_line: 2,
                    end_line: 3,
                },
                &["TWO-THREE"],
            ),
            change(
                "a.py",
                CodeChangeAction::Delete {
                    start_line: 5,
                    end_line: 5,
                },
                &[],
            ),
            change("a.py", CodeChangeAction::Insert { after_line: 5 }, &["six"]),
        ])
        .unwrap();

    assert_eq!(read(&dir, "a.py"), "zero\none\nTWO-THREE\nfour\nsix\n");
}

#[test]
fn apply_changes_keeps_order_of_stacked_inserts() {
    let dir = project(&[("a.py", "one\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("a.py")]).unwrap();

    manager
        .apply_changes(&[
            change("a.py", CodeChangeAction::Insert { after_line: 1 }, &["first"]),
            change("a.py", CodeChangeAction::Insert { after_line: 1 }, &["second"]),
        ])
        .unwrap();

    assert_eq!(read(&dir, "a.py"), "one\nfirst\nsecond\n");
}

#[test]
fn apply_changes_rejects_overlap_without_touching_disk() {
    let dir = project(&[("a.py", "one\ntwo\nthree\n"), ("b.py", "keep\n")]);
    let mut manager =
        CodeFileManager::new(dir.path(), &[PathBuf::from("a.py"), PathBuf::from("b.py")]).unwrap();

    let err = manager
        .apply_changes(&[
            change("b.py", CodeChangeAction::Insert { after_line: 1 }, &["added"]),
            change(
                "a.py",
                CodeChangeAction::Replace {
                    start_line: 1,
                    end_line: 2,
                },
                &["x"],
            ),
            change("a.py", CodeChangeAction::Insert { after_line: 1 }, &["y"]),
        ])
        .unwrap_err();

    assert!(err.to_string().contains("Overlapping changes"));
    assert_eq!(read(&dir, "a.py"), "one\ntwo\nthree\n");
    assert_eq!(read(&dir, "b.py"), "keep\n");
}

#[test]
fn apply_changes_rejects_out_of_range_lines() {
    let dir = project(&[("a.py", "one\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("a.py")]).unwrap();

    let err = manager
        .apply_changes(&[change(
            "a.py",
            CodeChangeAction::Delete {
                start_line: 1,
                end_line: 3,
            },
            &[],
        )])
        .unwrap_err();

    assert!(err.to_string().contains("out of range"));
}

#[test]
fn apply_changes_creates_and_deletes_files() {
    let dir = project(&[("old.py", "bye\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("old.py")]).unwrap();

    manager
        .apply_changes(&[
            change("pkg/new.py", CodeChangeAction::CreateFile, &["hello = 1"]),
            change("old.py", CodeChangeAction::DeleteFile, &[]),
        ])
        .unwrap();

    assert_eq!(read(&dir, "pkg/new.py"), "hello = 1\n");
    assert!(!dir.path().join("old.py").exists());
    assert_eq!(manager.files(), &[PathBuf::from("pkg/new.py")]);
}

#[test]
fn apply_changes_refuses_to_overwrite_on_create() {
    let dir = project(&[("a.py", "one\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("a.py")]).unwrap();

    let err = manager
        .apply_changes(&[change("a.py", CodeChangeAction::CreateFile, &["x"])])
        .unwrap_err();

    assert!(err.to_string().contains("already exists"));
}

#[test]
fn apply_changes_refuses_paths_outside_the_root() {
    let dir = project(&[("project/a.py", "one\n")]);
    let root = dir.path().join("project");
    let mut manager = CodeFileManager::new(&root, &[PathBuf::from("a.py")]).unwrap();

    let err = manager
        .apply_changes(&[
            change("a.py", CodeChangeAction::Insert { after_line: 1 }, &["two"]),
            change("../escaped.txt", CodeChangeAction::CreateFile, &["pwned"]),
        ])
        .unwrap_err();
    assert!(err.to_string().contains("outside the project"));
    assert!(!dir.path().join("escaped.txt").exists());
    assert_eq!(read(&dir, "project/a.py"), "one\n");

    let outside = dir.path().join("victim.txt");
    fs::write(&outside, "keep\n").unwrap();
    let err = manager
        .apply_changes(&[change(
            outside.to_str().unwrap(),
            CodeChangeAction::DeleteFile,
            &[],
        )])
        .unwrap_err();
    assert!(err.to_string().contains("absolute path"));
    assert!(outside.exists());
}

#[test]
fn apply_changes_keeps_crlf_line_endings() {
    let dir = project(&[("win.txt", "one\r\ntwo\r\n")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("win.txt")]).unwrap();

    manager
        .apply_changes(&[change(
            "win.txt",
            CodeChangeAction::Insert { after_line: 1 },
            &["between"],
        )])
        .unwrap();

    assert_eq!(read(&dir, "win.txt"), "one\r\nbetween\r\ntwo\r\n");
}

#[test]
fn apply_changes_keeps_missing_trailing_newline() {
    let dir = project(&[("a.py", "one\ntwo")]);
    let mut manager = CodeFileManager::new(dir.path(), &[PathBuf::from("a.py")]).unwrap();

    manager
        .apply_changes(&[change(
            "a.py",
            CodeChangeAction::Replace {
                start_line: 1,
                end_line: 1,
            },
            &["ONE"],
        )])
        .unwrap();

    assert_eq!(read(&dir, "a.py"), "ONE\ntwo");
}
