//! Terminal output formatting for modelbench.
//!
//! Functions are organized by domain:
//!
//! - [`banner`] - Scenario banners and footers
//! - [`messages`] - Error, warning, and info messages
//! - [`report`] - Timing and memory reports

pub mod banner;
pub mod messages;
pub mod report;

/// ANSI color codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const GRAY: &str = "\x1b[90m";
}

// Re-export colors at module level for convenience
pub use colors::*;

pub use banner::{print_phase_banner, print_phase_footer, BannerColor};
pub use messages::{print_error, print_header, print_info, print_interrupted, print_warning};
pub use report::{
    format_bytes, print_csv_diff, print_format_comparison, print_profile_report, print_run_diff,
    print_server_comparison,
};
