//! Console output utilities.

use console::{style, StyledObject};

#[derive(Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> StyledObject<&'static str> {
        match self {
            Level::Info => style("INFO").cyan().bold(),
            Level::Success => style("OK").green().bold(),
            Level::Warning => style("WARN").yellow().bold(),
            Level::Error => style("ERROR").red().bold(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Warning | Level::Error)
    }
}

fn emit(level: Level, message: &str) {
    // Warnings go to stderr so `--json` output stays parseable.
    if level.to_stderr() {
        eprintln!("{} {}", level.tag(), message);
    } else {
        println!("{} {}", level.tag(), message);
    }
}

pub fn print_info(message: &str) {
    emit(Level::Info, message);
}

pub fn print_success(message: &str) {
    emit(Level::Success, message);
}

pub fn print_warning(message: &str) {
    emit(Level::Warning, message);
}

pub fn print_error(message: &str) {
    emit(Level::Error, message);
}

/// Print the settings a detection runs with.
pub fn print_config_summary(backend: &str, location: &str, database: &str, threshold: u32) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Storage:   {} ({})", backend, location);
    println!("  Database:  {}", database);
    println!("  Threshold: {} bits", threshold);
    println!();
}
