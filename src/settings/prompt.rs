//! Yes/no confirmation

use crate::error::Result;
use std::io::{BufRead, Write};

/// Asks the user to confirm an action
pub trait Confirm {
    fn confirm(&self, label: &str) -> Result<bool>;
}

/// Confirmation on stdin/stdout; anything but `y`/`yes` declines
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, label: &str) -> Result<bool> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{} [y/N]: ", label)?;
        stdout.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
