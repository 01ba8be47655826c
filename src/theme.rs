//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use sweetswap::Candy;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Candy colours by palette index: drop, lollipop, chocolate, cookie, cupcake.
    pub candy: [Color; 5],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text, empty cells.
    pub inactive_fg: Color,
    /// Matched cells during the highlight phase.
    pub matched_bg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Fallback hex for every colour the theme knows, One Dark values.
const ONEDARK_CANDY: [&str; 5] = ["#E06C75", "#C678DD", "#E5C07B", "#98C379", "#61AFEF"];
const ONEDARK_BG: &str = "#31353F";
const ONEDARK_DIV: &str = "#3F444F";
const ONEDARK_FG: &str = "#ABB2BF";
const ONEDARK_TITLE: &str = "#E5C07B";
const ONEDARK_INACTIVE: &str = "#5C6370";
const ONEDARK_MATCHED: &str = "#4B6B4F";

/// Hex literal known to be valid; falls back to gray instead of panicking.
fn hex(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Gray)
}

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            candy: ONEDARK_CANDY.map(hex),
            bg: hex(ONEDARK_BG),
            div_line: hex(ONEDARK_DIV),
            main_fg: hex(ONEDARK_FG),
            title: hex(ONEDARK_TITLE),
            inactive_fg: hex(ONEDARK_INACTIVE),
            matched_bg: hex(ONEDARK_MATCHED),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override candy colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.candy = ["#FF0000", "#FF00FF", "#FFFF00", "#00FF00", "#0088FF"].map(hex);
            }
            crate::Palette::Colorblind => {
                // Paul Tol's bright scheme, distinguishable without red/green.
                self.candy = ["#EE6677", "#AA3377", "#CCBB44", "#228833", "#4477AA"].map(hex);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        // Candy keys first, then the btop keys carrying the matching hue.
        let fallbacks: [[&str; 2]; 5] = [
            ["cpu_end", "temp_end"],
            ["net_box", "proc_box"],
            ["title", "cpu_mid"],
            ["mem_box", "cpu_start"],
            ["cpu_box", "hi_fg"],
        ];
        let mut candy = [Color::Reset; 5];
        for (i, slot) in candy.iter_mut().enumerate() {
            *slot = get(&format!("candy_{i}"))
                .or_else(|| get(fallbacks[i][0]))
                .or_else(|| get(fallbacks[i][1]))
                .unwrap_or_else(|| hex(ONEDARK_CANDY[i]));
        }
        Self {
            candy,
            bg: get("meter_bg").unwrap_or_else(|| hex(ONEDARK_BG)),
            div_line: get("div_line").unwrap_or_else(|| hex(ONEDARK_DIV)),
            main_fg: get("main_fg").unwrap_or_else(|| hex(ONEDARK_FG)),
            title: get("title").unwrap_or_else(|| hex(ONEDARK_TITLE)),
            inactive_fg: get("inactive_fg").unwrap_or_else(|| hex(ONEDARK_INACTIVE)),
            matched_bg: get("selected_bg").unwrap_or_else(|| hex(ONEDARK_MATCHED)),
        }
    }

    #[inline]
    pub fn candy_color(&self, candy: Candy) -> Color {
        self.candy[candy.index() as usize % 5]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?),
        3 => (channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
