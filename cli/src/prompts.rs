//! Terminal prompts on stdin/stderr.

use std::io::{self, BufRead, Write};

use cyaudit::provision::BranchPrompter;

/// Reads one line after printing `message`. `None` on end of input.
pub fn read_line(message: &str) -> Option<String> {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "{}", message);
    let _ = stderr.flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Asks for a required value until a non-blank answer arrives.
pub fn ask_required(label: &str) -> Option<String> {
    loop {
        let answer = read_line(&format!("{}: ", label))?;
        if !answer.is_empty() {
            return Some(answer);
        }
        eprintln!("{} is required", label);
    }
}

/// Asks for a value that may be left blank.
pub fn ask_optional(label: &str, hint: &str) -> Option<String> {
    read_line(&format!("{} ({}): ", label, hint)).filter(|answer| !answer.is_empty())
}

/// Branch menu on the terminal.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl BranchPrompter for StdinPrompter {
    fn present(&self, commit: &str, candidates: &[String]) {
        eprintln!("Commit {} is contained in several branches:", commit);
        for (i, branch) in candidates.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, branch);
        }
    }

    fn ask(&self, message: &str) -> Option<String> {
        read_line(message)
    }

    fn reject(&self, message: &str) {
        eprintln!("{}", message);
    }
}
