//! Block-letter art for the tickcounter display.

use tickcounter_core::{ClockFields, TimeBreakdown};

/// Rows in every glyph.
pub const GLYPH_HEIGHT: usize = 5;

type Glyph = [&'static str; GLYPH_HEIGHT];

/// Digits `0`-`9`, 5 rows by 4 columns.
const DIGITS: [Glyph; 10] = [
    ["▟██▙", "█  █", "█  █", "█  █", "▜██▛"],
    [" ▟█ ", "  █ ", "  █ ", "  █ ", " ▗█▖"],
    ["▟██▙", "   █", "▟██▛", "█   ", "████"],
    ["▟██▙", "   █", " ██▌", "   █", "▜██▛"],
    ["█  █", "█  █", "████", "   █", "   █"],
    ["████", "█   ", "███▙", "   █", "▜██▛"],
    ["▟██▙", "█   ", "███▙", "█  █", "▜██▛"],
    ["████", "   █", "  ▟▛", "  █ ", "  █ "],
    ["▟██▙", "█  █", "▐██▌", "█  █", "▜██▛"],
    ["▟██▙", "█  █", "▜███", "   █", "▜██▛"],
];

const COLON: Glyph = [" ", "▪", " ", "▪", " "];

/// Unit suffixes after the years and days fields (3 columns).
const LETTER_Y: Glyph = ["   ", "█ █", "▜▄▛", " █ ", " █ "];
const LETTER_D: Glyph = ["  █", "  █", "▟▀█", "█ █", "▜▄█"];

fn glyph(c: char) -> Option<&'static Glyph> {
    match c {
        '0'..='9' => DIGITS.get(c as usize - '0' as usize),
        ':' => Some(&COLON),
        'y' => Some(&LETTER_Y),
        'd' => Some(&LETTER_D),
        _ => None,
    }
}

/// Render `text` as block letters, one string per row.
///
/// Spaces and characters without a glyph become a two-column gap.
pub fn render_text(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_HEIGHT];
    for (i, c) in text.chars().enumerate() {
        let art = glyph(c);
        for (row, line) in rows.iter_mut().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            match art {
                Some(g) => line.push_str(g[row]),
                None => line.push_str("  "),
            }
        }
    }
    rows
}

/// `hh:mm:ss` for clock mode.
pub fn build_clock_art(fields: &ClockFields) -> Vec<String> {
    let [h, m, s] = fields.hms_text();
    render_text(&format!("{h}:{m}:{s}"))
}

/// `[Ny] Nd hh:mm:ss` for countdown mode; years only when non-zero.
pub fn build_countdown_art(breakdown: &TimeBreakdown) -> Vec<String> {
    let [h, m, s] = breakdown.hms_text();
    let mut text = String::new();
    if breakdown.show_years() {
        text.push_str(&breakdown.years_text());
        text.push_str("y ");
    }
    text.push_str(&breakdown.days_text());
    text.push_str(&format!("d {h}:{m}:{s}"));
    render_text(&text)
}
