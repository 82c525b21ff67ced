//! Terminal formatting helpers for countdown display

/// Format a number of seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so 90 minutes renders as `90:00`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Render a progress fraction as a fixed-width bar of block characters.
///
/// The fraction is clamped to `[0, 1]`; NaN renders as empty.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = (((width as f64) * fraction).floor() as usize).min(width);
    let empty = width - filled;

    format!(
        "{}{}",
        "\u{2588}".repeat(filled), // filled blocks
        "\u{2591}".repeat(empty)   // empty blocks
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(90 * 60 + 5), "90:05");
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 4), "\u{2591}".repeat(4));
        assert_eq!(progress_bar(1.0, 4), "\u{2588}".repeat(4));
        assert_eq!(progress_bar(2.5, 4), "\u{2588}".repeat(4));
        assert_eq!(progress_bar(-1.0, 4), "\u{2591}".repeat(4));
        assert_eq!(progress_bar(f64::NAN, 2), "\u{2591}".repeat(2));
    }

    #[test]
    fn test_progress_bar_half() {
        let bar = progress_bar(0.5, 10);
        assert_eq!(bar.chars().filter(|c| *c == '\u{2588}').count(), 5);
        assert_eq!(bar.chars().count(), 10);
    }
}
