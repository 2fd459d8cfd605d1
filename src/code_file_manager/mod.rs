//! Tracks the files the user put in context, renders them for the model,
//! and applies accepted code changes back to disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;
use walkdir::WalkDir;

use crate::code_change::{CodeChange, CodeChangeAction, check_project_path};

/// Anything able to describe the current state of the codebase to the model.
pub trait CodeContext {
    fn code_message(&self) -> Result<String>;
}

#[derive(Debug)]
pub struct CodeFileManager {
    root: PathBuf,
    /// Paths relative to `root`, sorted.
    files: Vec<PathBuf>,
}

impl CodeFileManager {
    pub fn new(root: impl Into<PathBuf>, paths: &[PathBuf]) -> Result<Self> {
        let root = root.into();
        let mut files = Vec::new();

        for path in paths {
            let absolute = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            if !absolute.exists() {
                bail!("Path {} does not exist", path.display());
            }

            if absolute.is_dir() {
                for entry in WalkDir::new(&absolute)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
                {
                    let entry = entry.with_context(|| {
                        format!("Failed to walk directory {}", absolute.display())
                    })?;
                    if entry.file_type().is_file() && is_text_file(entry.path()) {
                        files.push(relative_to(&root, entry.path()));
                    }
                }
            } else {
                files.push(relative_to(&root, &absolute));
            }
        }

        files.sort();
        files.dedup();
        debug!(count = files.len(), "tracking code files");

        Ok(Self { root, files })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Apply changes to disk. Every change is validated before any file is
    /// written, so a rejected batch leaves the working tree untouched.
    pub fn apply_changes(&mut self, changes: &[CodeChange]) -> Result<()> {
        let mut by_file: BTreeMap<&Path, Vec<&CodeChange>> = BTreeMap::new();
        for change in changes {
            by_file.entry(change.file.as_path()).or_default().push(change);
        }

        let mut plans = Vec::with_capacity(by_file.len());
        for (file, file_changes) in by_file {
            plans.push((file, self.plan_file(file, &file_changes)?));
        }

        for (file, plan) in plans {
            let path = self.root.join(file);
            match plan {
                FilePlan::Write(text) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent).with_context(|| {
                            format!("Unable to create directory {}", parent.display())
                        })?;
                    }
                    fs::write(&path, text.render())
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !self.files.iter().any(|tracked| tracked == file) {
                        self.files.push(file.to_path_buf());
                        self.files.sort();
                    }
                }
                FilePlan::Remove => {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to delete {}", path.display()))?;
                    self.files.retain(|tracked| tracked != file);
                }
            }
        }

        Ok(())
    }

    fn plan_file(&self, file: &Path, changes: &[&CodeChange]) -> Result<FilePlan> {
        check_project_path(file)?;
        let path = self.root.join(file);

        if let [change] = changes {
            match change.action {
                CodeChangeAction::CreateFile => {
                    if path.exists() {
                        bail!("Cannot create {}: file already exists", file.display());
                    }
                    return Ok(FilePlan::Write(FileText::new(change.code_lines.clone())));
                }
                CodeChangeAction::DeleteFile => {
                    if !path.is_file() {
                        bail!("Cannot delete {}: file does not exist", file.display());
                    }
                    return Ok(FilePlan::Remove);
                }
                _ => {}
            }
        }

        if changes.iter().any(|change| {
            matches!(
                change.action,
                CodeChangeAction::CreateFile | CodeChangeAction::DeleteFile
            )
        }) {
            bail!(
                "{} has a whole-file change mixed with other changes",
                file.display()
            );
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut text = FileText::parse(&contents);
        let lines = &mut text.lines;
        let line_count = lines.len();

        // Sort bottom-up so earlier edits never shift later line numbers. Ties
        // run in reverse response order so stacked inserts keep their order.
        let mut ordered: Vec<(usize, &CodeChange)> = changes.iter().copied().enumerate().collect();
        ordered.sort_by_key(|(idx, change)| std::cmp::Reverse((anchor(&change.action), *idx)));

        let mut floor = usize::MAX;
        for (_, change) in ordered {
            match change.action {
                CodeChangeAction::Insert { after_line } => {
                    if after_line > line_count {
                        bail!(
                            "Insert after line {after_line} is past the end of {} ({line_count} lines)",
                            file.display()
                        );
                    }
                    if after_line >= floor {
                        bail!("Overlapping changes to {}", file.display());
                    }
                    lines.splice(after_line..after_line, change.code_lines.iter().cloned());
                    floor = after_line + 1;
                }
                CodeChangeAction::Replace {
                    start_line,
                    end_line,
                }
                | CodeChangeAction::Delete {
                    start_line,
                    end_line,
                } => {
                    if end_line > line_count {
                        bail!(
                            "Lines {start_line}-{end_line} are out of range for {} ({line_count} lines)",
                            file.display()
                        );
                    }
                    if end_line >= floor {
                        bail!("Overlapping changes to {}", file.display());
                    }
                    let replacement = match change.action {
                        CodeChangeAction::Replace { .. } => change.code_lines.clone(),
                        _ => Vec::new(),
                    };
                    lines.splice(start_line - 1..end_line, replacement);
                    floor = start_line;
                }
                CodeChangeAction::CreateFile | CodeChangeAction::DeleteFile => {}
            }
        }

        Ok(FilePlan::Write(text))
    }
}

impl CodeContext for CodeFileManager {
    fn code_message(&self) -> Result<String> {
        let mut message = String::from("Code Files:\n\n");

        for file in &self.files {
            let path = self.root.join(file);
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            message.push_str(&file.display().to_string());
            message.push('\n');
            for (idx, line) in contents.lines().enumerate() {
                message.push_str(&format!("{}:{}\n", idx + 1, line));
            }
            message.push('\n');
        }

        Ok(message)
    }
}

enum FilePlan {
    Write(FileText),
    Remove,
}

/// File contents split into lines, remembering the line ending and whether
/// the file ended with one so a rewrite keeps both.
struct FileText {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl FileText {
    fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            newline: "\n",
            trailing_newline: true,
        }
    }

    fn parse(contents: &str) -> Self {
        Self {
            lines: contents.lines().map(str::to_string).collect(),
            newline: if contents.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: contents.is_empty() || contents.ends_with('\n'),
        }
    }

    fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut rendered = self.lines.join(self.newline);
        if self.trailing_newline {
            rendered.push_str(self.newline);
        }
        rendered
    }
}

/// Position used to order edits bottom-up. An insert after line `n` sorts
/// just above a range ending on line `n`.
fn anchor(action: &CodeChangeAction) -> (usize, u8) {
    match *action {
        CodeChangeAction::Insert { after_line } => (after_line, 1),
        CodeChangeAction::Replace { end_line, .. } | CodeChangeAction::Delete { end_line, .. } => {
            (end_line, 0)
        }
        CodeChangeAction::CreateFile | CodeChangeAction::DeleteFile => (0, 0),
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

fn is_text_file(path: &Path) -> bool {
    fs::read(path)
        .map(|bytes| std::str::from_utf8(&bytes).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests;
