//! Live theme editing.
//!
//! Each token carries two views of the same color: OKLCH slider positions
//! and the text of a hex input. Moving a slider rewrites the hex text.
//! Entering a valid hex moves the sliders; invalid text is ignored so a
//! half-typed value never disturbs the sliders.

use super::{parse_color, Theme};
use crate::color::{Oklch, Rgb};
use std::collections::BTreeMap;

/// One OKLCH slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Lightness,
    Chroma,
    Hue,
}

impl Channel {
    /// Slider bounds.
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::Lightness => (0.0, 1.0),
            Self::Chroma => (0.0, 0.4),
            Self::Hue => (0.0, 360.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenState {
    pub sliders: Oklch,
    pub hex: String,
}

impl TokenState {
    fn from_color(color: Oklch) -> Self {
        Self {
            sliders: color,
            hex: color.to_hex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeEditor {
    name: String,
    tokens: BTreeMap<String, TokenState>,
}

impl ThemeEditor {
    /// Starts editing `theme`. Tokens with invalid colors are dropped.
    #[must_use]
    pub fn new(theme: &Theme) -> Self {
        let tokens = theme
            .colors
            .iter()
            .filter_map(|(token, value)| {
                parse_color(value).map(|color| (token.clone(), TokenState::from_color(color)))
            })
            .collect();
        Self {
            name: theme.name.clone(),
            tokens,
        }
    }

    #[must_use]
    pub fn token(&self, token: &str) -> Option<&TokenState> {
        self.tokens.get(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&str, &TokenState)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Moves one slider, clamped to its range. Returns `false` for an
    /// unknown token.
    pub fn set_slider(&mut self, token: &str, channel: Channel, value: f64) -> bool {
        let Some(state) = self.tokens.get_mut(token) else {
            return false;
        };
        let (min, max) = channel.range();
        let value = if value.is_finite() { value.clamp(min, max) } else { min };
        let Oklch { mut l, mut c, mut h } = state.sliders;
        match channel {
            Channel::Lightness => l = value,
            Channel::Chroma => c = value,
            Channel::Hue => h = value,
        }
        *state = TokenState::from_color(Oklch::new(l, c, h));
        tracing::trace!(token = %token, ?channel, value, hex = %state.hex, "slider moved");
        true
    }

    /// Applies hex input text. Returns `true` if the text was a valid color
    /// and the sliders moved.
    pub fn set_hex(&mut self, token: &str, text: &str) -> bool {
        let (Some(state), Some(rgb)) = (self.tokens.get_mut(token), Rgb::parse_hex(text)) else {
            tracing::trace!(token = %token, text = %text, "hex input ignored");
            return false;
        };
        state.sliders = rgb.to_oklch();
        state.hex = rgb.to_hex();
        true
    }

    /// The edited theme, every color written as OKLCH.
    #[must_use]
    pub fn to_theme(&self) -> Theme {
        Theme {
            name: self.name.clone(),
            colors: self
                .tokens
                .iter()
                .map(|(token, state)| (token.clone(), state.sliders.to_string()))
                .collect(),
        }
    }

    #[must_use]
    pub fn to_css(&self) -> String {
        self.to_theme().to_css()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> ThemeEditor {
        ThemeEditor::new(&Theme::default())
    }

    #[test]
    fn slider_updates_hex() {
        let mut editor = editor();
        assert!(editor.set_slider("primary", Channel::Lightness, 1.0));
        assert_eq!(editor.token("primary").unwrap().hex, "#ffffff");
        assert!(!editor.set_slider("nope", Channel::Hue, 10.0));
    }

    #[test]
    fn valid_hex_moves_sliders() {
        let mut editor = editor();
        assert!(editor.set_hex("primary", "#3366CC"));
        let state = editor.token("primary").unwrap();
        assert_eq!(state.hex, "#3366cc");
        assert!((state.sliders.h - 262.0).abs() < 6.0, "{}", state.sliders);
    }

    #[test]
    fn invalid_hex_is_ignored() {
        let mut editor = editor();
        let before = editor.token("primary").cloned();
        assert!(!editor.set_hex("primary", "#33"));
        assert_eq!(editor.token("primary").cloned(), before);
    }

    #[test]
    fn sliders_clamp() {
        let mut editor = editor();
        editor.set_slider("ring", Channel::Chroma, 2.0);
        assert!((editor.token("ring").unwrap().sliders.c - 0.4).abs() < 1e-12);
    }

    #[test]
    fn round_trips_to_theme() {
        let editor = editor();
        let theme = editor.to_theme();
        theme.validate().unwrap();
        assert_eq!(theme.colors.len(), Theme::default().colors.len());
    }
}
