//! User-facing console lines that sit outside the tracing stream: config
//! template notices, early errors, and the confirmation prompt.
//! Colors only when stdout is a TTY.

use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Ask a `(y/N)` question on stdout and read the answer from stdin.
/// Only `y` and `yes` (any case) count as yes; EOF counts as no.
pub fn confirm(question: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    if is_tty() {
        write!(stdout, "\n{} (y/N) ", question.bold())?;
    } else {
        write!(stdout, "\n{question} (y/N) ")?;
    }
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::is_yes;

    #[test]
    fn only_explicit_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
