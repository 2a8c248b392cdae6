//! Frames each benchmark scenario in the terminal.

use terminal_size::{terminal_size, Width};

use super::colors::*;

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const MIN_BANNER_WIDTH: usize = 20;
const MAX_BANNER_WIDTH: usize = 80;

/// Color options for scenario banners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BannerColor {
    /// A scenario is starting
    Cyan,
    /// Every command exited cleanly
    Green,
    /// A command failed
    Red,
    /// Interrupted or timed out
    Yellow,
}

impl BannerColor {
    pub fn ansi_code(&self) -> &'static str {
        match self {
            BannerColor::Cyan => CYAN,
            BannerColor::Green => GREEN,
            BannerColor::Red => RED,
            BannerColor::Yellow => YELLOW,
        }
    }
}

fn banner_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
        .clamp(MIN_BANNER_WIDTH, MAX_BANNER_WIDTH)
}

/// Centers ` title ` in a rule of `width` columns.
fn banner_line(title: &str, width: usize) -> String {
    let title = format!(" {} ", title);
    let remaining = width.saturating_sub(title.chars().count());
    let left = remaining / 2;
    format!("{}{}{}", "━".repeat(left), title, "━".repeat(remaining - left))
}

/// Print a color-coded banner such as `━━━ PARQUET FOOTPRINT ━━━`.
pub fn print_phase_banner(title: &str, color: BannerColor) {
    println!(
        "{}{BOLD}{}{RESET}",
        color.ansi_code(),
        banner_line(title, banner_width())
    );
}

/// Print the closing rule of a scenario, followed by a blank line.
pub fn print_phase_footer(color: BannerColor) {
    println!("{}{BOLD}{}{RESET}", color.ansi_code(), "━".repeat(banner_width()));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_color_ansi_codes() {
        assert_eq!(BannerColor::Cyan.ansi_code(), CYAN);
        assert_eq!(BannerColor::Green.ansi_code(), GREEN);
        assert_eq!(BannerColor::Red.ansi_code(), RED);
        assert_eq!(BannerColor::Yellow.ansi_code(), YELLOW);
    }

    #[test]
    fn test_banner_width_is_clamped() {
        let width = banner_width();
        assert!((MIN_BANNER_WIDTH..=MAX_BANNER_WIDTH).contains(&width));
    }

    #[test]
    fn test_banner_line_centers_title() {
        let line = banner_line("CSV", 11);
        assert_eq!(line, "━━━ CSV ━━━");
    }

    #[test]
    fn test_banner_line_long_title_is_not_padded() {
        let line = banner_line("A VERY LONG SCENARIO NAME", 10);
        assert_eq!(line, " A VERY LONG SCENARIO NAME ");
    }
}
