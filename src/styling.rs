//! Consolidated styling module for terminal output.
//!
//! This module uses the anstyle ecosystem:
//! - anstream for auto-detecting color support
//! - anstyle for composable styling
//! - Semantic style constants for domain-specific use

use anstyle::{AnsiColor, Color, Style};

// ============================================================================
// Re-exports from anstream (auto-detecting output)
// ============================================================================

/// Auto-detecting println that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::println;

/// Auto-detecting eprintln that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::eprintln;

// ============================================================================
// Semantic Style Constants
// ============================================================================

/// Error style (red) - use as `{ERROR}text{ERROR:#}`
pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Error style with bold - use as `{ERROR_BOLD}text{ERROR_BOLD:#}`
pub const ERROR_BOLD: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Hint style (dimmed) - use as `{HINT}text{HINT:#}`
pub const HINT: Style = Style::new().dimmed();

/// Progress style (cyan) - use as `{PROGRESS}text{PROGRESS:#}`
pub const PROGRESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));

/// Success style (green) - use as `{SUCCESS}text{SUCCESS:#}`
pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

/// Bold variant of the success style, for the version itself
pub const SUCCESS_BOLD: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Green)));

// ============================================================================
// Message Emojis
// ============================================================================

/// Progress emoji - use with PROGRESS style
pub const PROGRESS_EMOJI: &str = "🔄";

/// Success emoji - use with SUCCESS style
pub const SUCCESS_EMOJI: &str = "✅";

/// Error emoji - use with ERROR style: `eprintln!("{ERROR_EMOJI} {ERROR}message{ERROR:#}");`
pub const ERROR_EMOJI: &str = "❌";

/// Hint emoji - use with HINT style: `println!("{HINT_EMOJI} {HINT}message{HINT:#}");`
pub const HINT_EMOJI: &str = "💡";

// ============================================================================
// Gutter formatting
// ============================================================================

/// Prefix each line of `content` with a dimmed gutter bar.
///
/// Used for quoting commands and child output underneath a header line.
pub fn format_with_gutter(content: &str) -> String {
    content
        .lines()
        .map(|line| format!("{HINT}┃{HINT:#} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
