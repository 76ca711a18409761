//! # Theme System
//!
//! Colors used by the terminal renderer, grouped by role. The active theme
//! is chosen by name in the config file.
//!
//! ## Built-in Themes
//!
//! - **Catppuccin Mocha** (default) - warm, dark pastel theme
//! - **Catppuccin Latte** - light pastel theme
//! - **Dracula** - dark theme with vivid colors
//! - **Nord** - arctic, north-bluish color palette

use ratatui::style::Color;

/// All colors used by the flashdeck TUI, grouped by semantic role.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Human-readable name, matched against the config value.
    pub name: &'static str,

    /// Main background color for panes and dialogs.
    pub bg: Color,

    /// Primary text color.
    pub fg: Color,
    /// Muted text: hints, footer, background content behind a dialog.
    pub fg_dim: Color,

    /// Focused borders, the selected deck, dialog frame.
    pub accent: Color,
    /// Search text, match counts, card back.
    pub secondary: Color,

    /// Destructive prompts.
    pub error: Color,

    /// Background of the focused element.
    pub focus_bg: Color,
}

impl Theme {
    /// Return the list of all built-in themes.
    pub fn all() -> &'static [Theme] {
        &BUILT_IN_THEMES
    }

    /// Find a built-in theme by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static Theme> {
        BUILT_IN_THEMES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Return the default theme (Catppuccin Mocha).
    pub fn default_theme() -> &'static Theme {
        &BUILT_IN_THEMES[0]
    }
}

static BUILT_IN_THEMES: [Theme; 4] = [
    Theme {
        name: "Catppuccin Mocha",
        bg: Color::Rgb(30, 30, 46),           // base
        fg: Color::Rgb(205, 214, 244),        // text
        fg_dim: Color::Rgb(108, 112, 134),    // overlay0
        accent: Color::Rgb(137, 180, 250),    // blue
        secondary: Color::Rgb(249, 226, 175), // yellow
        error: Color::Rgb(243, 139, 168),     // red
        focus_bg: Color::Rgb(69, 71, 90),     // surface1
    },
    Theme {
        name: "Catppuccin Latte",
        bg: Color::Rgb(239, 241, 245),         // base
        fg: Color::Rgb(76, 79, 105),           // text
        fg_dim: Color::Rgb(156, 160, 176),     // overlay0
        accent: Color::Rgb(30, 102, 245),      // blue
        secondary: Color::Rgb(223, 142, 29),   // yellow
        error: Color::Rgb(210, 15, 57),        // red
        focus_bg: Color::Rgb(188, 192, 204),   // surface1
    },
    Theme {
        name: "Dracula",
        bg: Color::Rgb(40, 42, 54),
        fg: Color::Rgb(248, 248, 242),
        fg_dim: Color::Rgb(98, 114, 164),
        accent: Color::Rgb(139, 233, 253),    // cyan
        secondary: Color::Rgb(241, 250, 140), // yellow
        error: Color::Rgb(255, 85, 85),
        focus_bg: Color::Rgb(68, 71, 90),
    },
    Theme {
        name: "Nord",
        bg: Color::Rgb(46, 52, 64),
        fg: Color::Rgb(216, 222, 233),
        fg_dim: Color::Rgb(76, 86, 106),
        accent: Color::Rgb(136, 192, 208),    // frost
        secondary: Color::Rgb(235, 203, 139), // yellow
        error: Color::Rgb(191, 97, 106),
        focus_bg: Color::Rgb(67, 76, 94),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    /// Convert a catppuccin color to a ratatui Color via its RGB values.
    fn ctp(color: catppuccin::Color) -> Color {
        Color::Rgb(color.rgb.r, color.rgb.g, color.rgb.b)
    }

    #[test]
    fn test_default_is_mocha() {
        assert_eq!(Theme::default_theme().name, "Catppuccin Mocha");
    }

    #[test]
    fn test_by_name_case_insensitive() {
        assert!(Theme::by_name("catppuccin latte").is_some());
        assert!(Theme::by_name("NORD").is_some());
        assert!(Theme::by_name("nonexistent").is_none());
    }

    #[test]
    fn test_catppuccin_mocha_matches_palette() {
        let mocha = catppuccin::PALETTE.mocha.colors;
        let theme = Theme::default_theme();
        assert_eq!(theme.bg, ctp(mocha.base));
        assert_eq!(theme.fg, ctp(mocha.text));
        assert_eq!(theme.accent, ctp(mocha.blue));
        assert_eq!(theme.error, ctp(mocha.red));
        assert_eq!(theme.focus_bg, ctp(mocha.surface1));
    }

    #[test]
    fn test_catppuccin_latte_matches_palette() {
        let latte = catppuccin::PALETTE.latte.colors;
        let theme = Theme::by_name("Catppuccin Latte").expect("theme exists");
        assert_eq!(theme.bg, ctp(latte.base));
        assert_eq!(theme.fg, ctp(latte.text));
        assert_eq!(theme.accent, ctp(latte.blue));
        assert_eq!(theme.error, ctp(latte.red));
    }

    #[test]
    fn test_all_themes_have_distinct_names() {
        let names: Vec<&str> = Theme::all().iter().map(|t| t.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len(), "duplicate theme names found");
    }
}
