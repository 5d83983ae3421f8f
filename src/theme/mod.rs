//! Color themes for table chrome.
//!
//! A theme maps design-token names (`background`, `primary`, `border`, ...)
//! to colors written either as hex or as `oklch(...)`. Themes are emitted as
//! CSS custom properties, always in OKLCH.
//!
//! # Built-in Themes
//!
//! - `neutral`: pure greys (default)
//! - `slate`: blue-tinted greys
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! background = "oklch(1 0 0)"
//! foreground = "#0a0a0a"
//! primary = "oklch(0.205 0 0)"
//! ```
//!
//! # Example
//!
//! ```
//! use tablesync::theme::Theme;
//!
//! let theme = Theme::from_name("slate").unwrap();
//! assert!(theme.to_css().contains("--primary: oklch(0.2080 0.0420 "));
//! ```

pub mod editor;

pub use editor::{Channel, ThemeEditor, TokenState};

use crate::color::{Oklch, Rgb};
use crate::domain::{Result, TableSyncError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Names accepted by [`Theme::from_name`].
pub const BUILT_IN: [&str; 2] = ["neutral", "slate"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    /// Token name to color, hex or `oklch(...)`.
    pub colors: BTreeMap<String, String>,
}

/// Parses a hex or `oklch(...)` color.
#[must_use]
pub fn parse_color(value: &str) -> Option<Oklch> {
    let value = value.trim();
    if value.starts_with("oklch(") {
        Oklch::parse(value)
    } else {
        Rgb::parse_hex(value).map(Rgb::to_oklch)
    }
}

impl Theme {
    /// Loads a built-in theme by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "neutral" => include_str!("../../themes/neutral.toml"),
            "slate" => include_str!("../../themes/slate.toml"),
            _ => return None,
        };
        toml::from_str(toml_str).ok()
    }

    /// Loads and validates a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or a
    /// color does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let theme: Self = toml::from_str(&contents)?;
        theme.validate()?;
        Ok(theme)
    }

    /// Checks that every color parses.
    ///
    /// # Errors
    ///
    /// Returns [`TableSyncError::Theme`] naming the first bad token.
    pub fn validate(&self) -> Result<()> {
        match self.colors.iter().find(|(_, value)| parse_color(value).is_none()) {
            Some((token, value)) => Err(TableSyncError::Theme(format!(
                "color `{value}` for `{token}` is neither hex nor oklch"
            ))),
            None => Ok(()),
        }
    }

    /// The color of `token`, if present and valid.
    #[must_use]
    pub fn color(&self, token: &str) -> Option<Oklch> {
        self.colors.get(token).and_then(|value| parse_color(value))
    }

    /// Renders the theme as a `:root` block of CSS custom properties.
    ///
    /// Invalid colors are skipped.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (token, value) in &self.colors {
            match parse_color(value) {
                Some(color) => {
                    let _ = writeln!(css, "  --{token}: {color};");
                }
                None => tracing::debug!(token = %token, value = %value, "skipping invalid theme color"),
            }
        }
        css.push_str("}\n");
        css
    }
}

impl Default for Theme {
    /// The `neutral` theme.
    fn default() -> Self {
        Self::from_name("neutral").unwrap_or_else(|| Self {
            name: "neutral".to_string(),
            colors: BTreeMap::new(),
        })
    }
}
