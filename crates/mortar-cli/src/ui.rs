//! Status lines on stderr.

use console::style;

/// Respects `NO_COLOR` and `FORCE_COLOR`, then terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Applies the color decision to every `style(..)` call.
pub fn init_colors(no_color: bool) {
    console::set_colors_enabled_stderr(!no_color && should_use_color());
}

pub fn success(message: &str) {
    eprintln!("{} {message}", style("✓").green().bold().for_stderr());
}

pub fn info(message: &str) {
    eprintln!("{} {message}", style("ℹ").blue().bold().for_stderr());
}

pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        style("⚠").yellow().bold().for_stderr(),
        style(message).yellow().for_stderr()
    );
}

pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        style("✗").red().bold().for_stderr(),
        style(message).red().for_stderr()
    );
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}
