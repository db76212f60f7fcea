//! Color themes for Broadside
//!
//! Four retro-inspired schemes selectable via `--theme` / `THEME`.

use ratatui::style::Color;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Nord-inspired theme (default) - modern muted colors
    Nord,
    /// Classic DOS Blue - bright white on blue background
    DosBlue,
    /// Amber CRT - orange/amber text on black
    AmberCrt,
    /// Green Phosphor - green text on black
    GreenPhosphor,
}

impl std::str::FromStr for Theme {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nord" => Ok(Theme::Nord),
            "dos" | "dosblue" | "dos-blue" => Ok(Theme::DosBlue),
            "amber" | "ambercrt" | "amber-crt" => Ok(Theme::AmberCrt),
            "green" | "greenphosphor" | "green-phosphor" => Ok(Theme::GreenPhosphor),
            _ => Err(anyhow::anyhow!(
                "Unknown theme '{s}'. Available: nord, dos-blue, amber-crt, green-phosphor"
            )),
        }
    }
}

impl Theme {
    pub fn colors(&self) -> ColorScheme {
        match self {
            Theme::Nord => ColorScheme::nord(),
            Theme::DosBlue => ColorScheme::dos_blue(),
            Theme::AmberCrt => ColorScheme::amber_crt(),
            Theme::GreenPhosphor => ColorScheme::green_phosphor(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Nord
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Nord => write!(f, "nord"),
            Theme::DosBlue => write!(f, "dos-blue"),
            Theme::AmberCrt => write!(f, "amber-crt"),
            Theme::GreenPhosphor => write!(f, "green-phosphor"),
        }
    }
}

/// Color scheme for a theme
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    pub background: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text color (for secondary info)
    pub text_dim: Color,
    pub focus_border: Color,
    pub unfocused_border: Color,
    /// Selected menu entries and the board cursor
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub toast_success: Color,
    pub toast_error: Color,
    pub debug_indicator: Color,
    // Board cells
    pub water: Color,
    pub ship: Color,
    pub ship_hit: Color,
    pub miss: Color,
    pub sunk: Color,
    /// Cell with an attack in flight
    pub loading: Color,
    pub ghost_ok: Color,
    pub ghost_bad: Color,
}

impl ColorScheme {
    /// Nord theme (default) - modern muted colors
    pub fn nord() -> Self {
        Self {
            background: Color::Black,
            text: Color::White,
            text_dim: Color::Gray,
            focus_border: Color::Yellow,
            unfocused_border: Color::Gray,
            selection_bg: Color::Yellow,
            selection_fg: Color::Black,
            toast_success: Color::Green,
            toast_error: Color::Red,
            debug_indicator: Color::Magenta,
            water: Color::Rgb(94, 129, 172),
            ship: Color::Rgb(136, 192, 208),
            ship_hit: Color::Rgb(191, 97, 106),
            miss: Color::Rgb(76, 86, 106),
            sunk: Color::Rgb(180, 60, 70),
            loading: Color::Rgb(235, 203, 139),
            ghost_ok: Color::Rgb(163, 190, 140),
            ghost_bad: Color::Rgb(191, 97, 106),
        }
    }

    /// DOS Blue theme - classic DOS aesthetic
    pub fn dos_blue() -> Self {
        Self {
            background: Color::Blue,
            text: Color::White,
            text_dim: Color::LightBlue,
            focus_border: Color::Yellow,
            unfocused_border: Color::Cyan,
            selection_bg: Color::Cyan,
            selection_fg: Color::Black,
            toast_success: Color::LightGreen,
            toast_error: Color::LightRed,
            debug_indicator: Color::LightMagenta,
            water: Color::LightBlue,
            ship: Color::White,
            ship_hit: Color::LightRed,
            miss: Color::Cyan,
            sunk: Color::Red,
            loading: Color::Yellow,
            ghost_ok: Color::LightGreen,
            ghost_bad: Color::LightRed,
        }
    }

    /// Amber CRT theme - retro terminal
    pub fn amber_crt() -> Self {
        let amber = Color::Rgb(255, 176, 0);
        let amber_bright = Color::Rgb(255, 200, 100);
        let amber_dim = Color::Rgb(180, 120, 0);

        Self {
            background: Color::Black,
            text: amber,
            text_dim: amber_dim,
            focus_border: amber_bright,
            unfocused_border: amber_dim,
            selection_bg: amber,
            selection_fg: Color::Black,
            toast_success: Color::Rgb(100, 255, 100),
            toast_error: Color::Red,
            debug_indicator: Color::Rgb(255, 100, 255),
            water: amber_dim,
            ship: amber,
            ship_hit: Color::Red,
            miss: Color::Rgb(120, 80, 0),
            sunk: Color::Red,
            loading: amber_bright,
            ghost_ok: Color::Rgb(100, 255, 100),
            ghost_bad: Color::Red,
        }
    }

    /// Green Phosphor theme - classic green screen
    pub fn green_phosphor() -> Self {
        let green = Color::Rgb(0, 255, 0);
        let green_dim = Color::Rgb(0, 180, 0);
        let green_bright = Color::Rgb(100, 255, 100);

        Self {
            background: Color::Black,
            text: green,
            text_dim: green_dim,
            focus_border: green_bright,
            unfocused_border: green_dim,
            selection_bg: green,
            selection_fg: Color::Black,
            toast_success: green_bright,
            toast_error: Color::Red,
            debug_indicator: Color::Cyan,
            water: Color::Rgb(0, 120, 0),
            ship: green,
            ship_hit: Color::Red,
            miss: Color::Rgb(0, 90, 0),
            sunk: Color::Red,
            loading: green_bright,
            ghost_ok: green_bright,
            ghost_bad: Color::Red,
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::nord()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parsing() {
        assert_eq!("nord".parse::<Theme>().unwrap(), Theme::Nord);
        assert_eq!("NORD".parse::<Theme>().unwrap(), Theme::Nord);
        assert_eq!("dos".parse::<Theme>().unwrap(), Theme::DosBlue);
        assert_eq!("dos-blue".parse::<Theme>().unwrap(), Theme::DosBlue);
        assert_eq!("amber".parse::<Theme>().unwrap(), Theme::AmberCrt);
        assert_eq!("green".parse::<Theme>().unwrap(), Theme::GreenPhosphor);
        assert!("invalid".parse::<Theme>().is_err());
    }

    #[test]
    fn test_all_themes_have_colors() {
        for theme in &[Theme::Nord, Theme::DosBlue, Theme::AmberCrt, Theme::GreenPhosphor] {
            let colors = theme.colors();
            let _ = colors.background;
            let _ = colors.loading;
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for theme in [Theme::Nord, Theme::DosBlue, Theme::AmberCrt, Theme::GreenPhosphor] {
            assert_eq!(theme.to_string().parse::<Theme>().unwrap(), theme);
        }
    }
}
