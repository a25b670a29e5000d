//! Container log consumers

use crossterm::style::{Color, Stylize};
use std::io::Write;

const PALETTE: &[Color] = &[
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::DarkCyan,
    Color::DarkYellow,
    Color::DarkGreen,
    Color::DarkMagenta,
    Color::DarkBlue,
];

/// Receives output lines from attached containers
pub trait LogConsumer: Send + Sync {
    /// A line written to stdout by `container`
    fn log(&self, container: &str, message: &str);

    /// A line written to stderr by `container`
    fn err(&self, container: &str, message: &str) {
        self.log(container, message);
    }
}

/// Prints container output to the terminal
#[derive(Debug, Clone)]
pub struct ConsoleLogConsumer {
    color: bool,
    prefix: bool,
}

impl ConsoleLogConsumer {
    /// Create a consumer; `color` and `prefix` control line decoration
    pub fn new(color: bool, prefix: bool) -> Self {
        Self { color, prefix }
    }

    /// Render one line the way it is printed
    pub fn format_line(&self, container: &str, message: &str) -> String {
        if !self.prefix || container.is_empty() {
            return message.to_string();
        }

        let label = format!("{} |", container);
        if self.color {
            format!("{} {}", label.with(color_for(container)), message)
        } else {
            format!("{} {}", label, message)
        }
    }
}

impl LogConsumer for ConsoleLogConsumer {
    fn log(&self, container: &str, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", self.format_line(container, message));
    }

    fn err(&self, container: &str, message: &str) {
        let mut out = std::io::stderr().lock();
        let _ = writeln!(out, "{}", self.format_line(container, message));
    }
}

/// Stable color per container name
fn color_for(container: &str) -> Color {
    let hash = container
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    PALETTE[hash % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prefix() {
        let consumer = ConsoleLogConsumer::new(false, true);
        assert_eq!(consumer.format_line("web-1", "ready"), "web-1 | ready");
    }

    #[test]
    fn test_no_prefix() {
        let consumer = ConsoleLogConsumer::new(true, false);
        assert_eq!(consumer.format_line("web-1", "ready"), "ready");
    }

    #[test]
    fn test_colored_prefix_keeps_message() {
        let consumer = ConsoleLogConsumer::new(true, true);
        let line = consumer.format_line("web-1", "ready");
        assert!(line.contains("web-1 |"));
        assert!(line.ends_with(" ready"));
    }

    #[test]
    fn test_color_is_stable() {
        assert_eq!(color_for("db-1"), color_for("db-1"));
    }
}
