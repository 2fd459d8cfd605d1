use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

/// Edit the model proposed for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChange {
    pub file: PathBuf,
    pub action: CodeChangeAction,
    pub code_lines: Vec<String>,
}

/// Line numbers are 1-based and inclusive, matching the numbering the model
/// sees in the code message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChangeAction {
    Insert { after_line: usize },
    Replace { start_line: usize, end_line: usize },
    Delete { start_line: usize, end_line: usize },
    CreateFile,
    DeleteFile,
}

impl CodeChangeAction {
    pub fn needs_code(&self) -> bool {
        matches!(
            self,
            CodeChangeAction::Insert { .. }
                | CodeChangeAction::Replace { .. }
                | CodeChangeAction::CreateFile
        )
    }
}

impl fmt::Display for CodeChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeChangeAction::Insert { after_line } => write!(f, "insert after line {after_line}"),
            CodeChangeAction::Replace {
                start_line,
                end_line,
            } => write!(f, "replace lines {start_line}-{end_line}"),
            CodeChangeAction::Delete {
                start_line,
                end_line,
            } => write!(f, "delete lines {start_line}-{end_line}"),
            CodeChangeAction::CreateFile => write!(f, "create file"),
            CodeChangeAction::DeleteFile => write!(f, "delete file"),
        }
    }
}

impl fmt::Display for CodeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.action)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ChangeHeader {
    file: PathBuf,
    action: String,
    insert_after_line: Option<usize>,
    start_line: Option<usize>,
    end_line: Option<usize>,
}

impl CodeChange {
    /// Build a change from the JSON header of a change block and the code
    /// lines that followed it.
    pub fn from_header(header_json: &str, code_lines: Vec<String>) -> Result<Self> {
        let header: ChangeHeader = serde_json::from_str(header_json)
            .with_context(|| format!("Failed to parse code change header: {header_json}"))?;

        if header.file.as_os_str().is_empty() {
            bail!("Code change header is missing a file path");
        }
        check_project_path(&header.file)?;

        let action = match header.action.as_str() {
            "insert" => CodeChangeAction::Insert {
                after_line: header.insert_after_line.ok_or_else(|| {
                    anyhow!(
                        "Insert into {} is missing insert-after-line",
                        header.file.display()
                    )
                })?,
            },
            "replace" | "delete" => {
                let (start_line, end_line) = match (header.start_line, header.end_line) {
                    (Some(start), Some(end)) => (start, end),
                    _ => bail!(
                        "{} of {} is missing start-line or end-line",
                        header.action,
                        header.file.display()
                    ),
                };
                if start_line == 0 || end_line < start_line {
                    bail!(
                        "Invalid line range {start_line}-{end_line} for {}",
                        header.file.display()
                    );
                }
                if header.action == "replace" {
                    CodeChangeAction::Replace {
                        start_line,
                        end_line,
                    }
                } else {
                    CodeChangeAction::Delete {
                        start_line,
                        end_line,
                    }
                }
            }
            "create-file" => CodeChangeAction::CreateFile,
            "delete-file" => CodeChangeAction::DeleteFile,
            other => bail!("Unknown code change action '{other}'"),
        };

        Ok(Self {
            file: header.file,
            action,
            code_lines,
        })
    }
}

/// Paths in a change are resolved against the project root, so they must be
/// relative and must not climb out of it.
pub fn check_project_path(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                bail!("Refusing path outside the project: {}", path.display())
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("Refusing absolute path: {}", path.display())
            }
        }
    }
    Ok(())
}
