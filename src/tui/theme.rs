use ratatui::style::Color;

use crate::model::UiConfig;
use crate::model::cockpit::SegmentKind;

/// Parsed color theme for the cockpit
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub purple: Color,
    pub selection_bg: Color,
    /// Second shade for alternating ✅ ribbon blocks
    pub ribbon_alt: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            cyan: Color::Rgb(0x44, 0xDD, 0xFF),
            purple: Color::Rgb(0xCC, 0x66, 0xFF),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            ribbon_alt: Color::Rgb(0x2E, 0xB8, 0x6A),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Create a theme from the vault's `[ui.colors]`, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();

        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                log::warn!("ignoring ui.colors.{}: not a #RRGGBB color", key);
                continue;
            };
            match key.as_str() {
                "background" => theme.background = color,
                "text" => theme.text = color,
                "text_bright" => theme.text_bright = color,
                "highlight" => theme.highlight = color,
                "dim" => theme.dim = color,
                "red" => theme.red = color,
                "yellow" => theme.yellow = color,
                "green" => theme.green = color,
                "cyan" => theme.cyan = color,
                "purple" => theme.purple = color,
                "selection_bg" => theme.selection_bg = color,
                "ribbon_alt" => theme.ribbon_alt = color,
                _ => log::warn!("ignoring unknown color slot ui.colors.{}", key),
            }
        }

        theme
    }

    /// Color of the `index`-th ribbon block
    pub fn segment_color(&self, kind: SegmentKind, index: usize) -> Color {
        match kind {
            SegmentKind::Running => self.highlight,
            SegmentKind::Done if index % 2 == 0 => self.green,
            SegmentKind::Done => self.ribbon_alt,
        }
    }

    /// Countdown color: calm, then yellow in the last five minutes, red once overrun
    pub fn countdown_color(&self, remaining_seconds: i64) -> Color {
        if remaining_seconds < 0 {
            self.red
        } else if remaining_seconds <= 5 * 60 {
            self.yellow
        } else {
            self.text_bright
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#FF4444"),
            Some(Color::Rgb(0xFF, 0x44, 0x44))
        );
        assert_eq!(
            parse_hex_color("#0C001B"),
            Some(Color::Rgb(0x0C, 0x00, 0x1B))
        );
        assert_eq!(parse_hex_color("FF4444"), None); // missing #
        assert_eq!(parse_hex_color("#FF44"), None); // too short
        assert_eq!(parse_hex_color("#ZZZZZZ"), None); // invalid hex
    }

    #[test]
    fn test_from_config_overrides() {
        let mut ui = UiConfig::default();
        ui.colors.insert("background".into(), "#000000".into());
        ui.colors.insert("highlight".into(), "not a color".into());

        let theme = Theme::from_config(&ui);
        assert_eq!(theme.background, Color::Rgb(0, 0, 0));
        // Bad values keep the default
        assert_eq!(theme.highlight, Color::Rgb(0xFB, 0x41, 0x96));
        assert_eq!(theme.text, Color::Rgb(0xB0, 0xAA, 0xFF));
    }

    #[test]
    fn test_segment_colors_alternate() {
        let theme = Theme::default();
        assert_eq!(theme.segment_color(SegmentKind::Done, 0), theme.green);
        assert_eq!(theme.segment_color(SegmentKind::Done, 1), theme.ribbon_alt);
        assert_eq!(theme.segment_color(SegmentKind::Running, 1), theme.highlight);
    }

    #[test]
    fn test_countdown_color() {
        let theme = Theme::default();
        assert_eq!(theme.countdown_color(1200), theme.text_bright);
        assert_eq!(theme.countdown_color(300), theme.yellow);
        assert_eq!(theme.countdown_color(-1), theme.red);
    }
}
