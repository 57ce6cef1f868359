use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::context::{Verbosity, verbosity};

fn shown(level: Verbosity) -> bool {
    verbosity() >= level
}

/// Print a success message.
pub fn success(msg: &str) {
    if shown(Verbosity::Normal) {
        println!("  {} {}", "✓".green(), msg);
    }
}

/// Print a warning message.
pub fn warning(msg: &str) {
    if shown(Verbosity::Normal) {
        println!("  {} {}", "⚠".yellow(), msg);
    }
}

/// Print an error message. Always shown.
pub fn error(msg: &str) {
    eprintln!("  {} {}", "✗".red(), msg);
}

/// Print a header line.
pub fn header(msg: &str) {
    if shown(Verbosity::Normal) {
        println!("\n{}", msg.bold());
    }
}

/// Print a secondary detail line, only in verbose mode.
pub fn detail(msg: &str) {
    if shown(Verbosity::Verbose) {
        println!("    {}", msg.dimmed());
    }
}

/// Start a spinner on stderr. Hidden in quiet mode and when not on a terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    if !shown(Verbosity::Normal) {
        return ProgressBar::hidden();
    }
    let sp = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        sp.set_style(style);
    }
    sp.set_message(msg.to_string());
    sp.enable_steady_tick(Duration::from_millis(100));
    sp
}

/// Clear a spinner without leaving a line behind.
pub fn finish_spinner(sp: ProgressBar) {
    sp.finish_and_clear();
}

/// Seconds with two decimals, for timings.
pub fn seconds(d: Duration) -> String {
    format!("{:.2}s", d.as_secs_f64())
}

/// First line of `text`, cut to `max` characters.
pub fn first_line(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max {
        line.to_string()
    } else {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
