//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Spinners
//! - Detection and history reports

pub mod console;
pub mod progress;
pub mod report;

pub use console::{print_config_summary, print_error, print_info, print_success, print_warning};
pub use progress::scan_spinner;
pub use report::{media_to_json, print_detection_report, print_groups};
