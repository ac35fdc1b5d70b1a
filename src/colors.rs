//! Terminal colors for request ids and route labels in the log.

use owo_colors::{AnsiColors, DynColors, OwoColorize, Style};

use crate::proxy::RouteKind;

/// Palette for request ids, standard then bright variants.
const ID_COLORS: [AnsiColors; 12] = [
    AnsiColors::Red,
    AnsiColors::Green,
    AnsiColors::Yellow,
    AnsiColors::Blue,
    AnsiColors::Magenta,
    AnsiColors::Cyan,
    AnsiColors::BrightRed,
    AnsiColors::BrightGreen,
    AnsiColors::BrightYellow,
    AnsiColors::BrightBlue,
    AnsiColors::BrightMagenta,
    AnsiColors::BrightCyan,
];

/// Stable color for a request id, so every line of one request matches.
pub fn color_for_id(id: &str) -> AnsiColors {
    let hash = id
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32));
    ID_COLORS[hash as usize % ID_COLORS.len()]
}

/// `[id]` in the id's color.
pub fn colored_id(id: &str) -> String {
    let style = Style::new().color(DynColors::Ansi(color_for_id(id)));
    format!("[{}]", id).style(style).to_string()
}

/// Upstream name of a proxied request, colored per upstream.
pub fn route_label(kind: RouteKind) -> String {
    match kind {
        RouteKind::Auth => kind.label().magenta().to_string(),
        RouteKind::Hub => kind.label().yellow().to_string(),
        RouteKind::Kai => kind.label().cyan().to_string(),
    }
}

pub fn static_label() -> String {
    "STATIC".green().to_string()
}
