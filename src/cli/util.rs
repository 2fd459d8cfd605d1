use anyhow::Result;
use std::io::{self, Write};

/// Read one trimmed line from stdin; `None` on end of input.
pub(crate) fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{prompt} [y/N]: "))?;
    Ok(answer.is_some_and(|answer| is_yes(&answer)))
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub(crate) fn is_quit(request: &str) -> bool {
    matches!(request, "q" | "quit" | "exit")
}
