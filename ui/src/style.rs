//! Colors, spacing and widget styles.
//!
//! New widgets should be styled through these helpers so the gallery keeps a
//! consistent look.

use iced::theme;
use iced::widget::{button, container};
use iced::{Border, Color, Theme};

pub struct Palette;

impl Palette {
    pub const PRIMARY: Color = Color { r: 0.25, g: 0.32, b: 0.71, a: 1.0 }; // Indigo 700
    pub const ON_PRIMARY: Color = Color::WHITE;
    pub const SURFACE: Color = Color { r: 0.98, g: 0.98, b: 0.98, a: 1.0 };
    pub const ON_SURFACE: Color = Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 };
    pub const SELECTED: Color = Color { r: 0.99, g: 0.76, b: 0.03, a: 1.0 }; // Amber 500
    pub const ERROR: Color = Color { r: 0.80, g: 0.0, b: 0.0, a: 1.0 };

    pub const SPACING: u16 = 16;
    pub const THUMB_SIZE: f32 = 150.0;
}

struct PrimaryButton;

impl button::StyleSheet for PrimaryButton {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Palette::PRIMARY.into()),
            text_color: Palette::ON_PRIMARY,
            border: Border {
                radius: 4.0.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Grid tile; `selected` draws a highlighted frame.
struct Tile {
    selected: bool,
}

impl button::StyleSheet for Tile {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        let (color, width) = if self.selected {
            (Palette::SELECTED, 3.0)
        } else {
            (Palette::SURFACE, 1.0)
        };
        button::Appearance {
            background: Some(Palette::SURFACE.into()),
            text_color: Palette::ON_SURFACE,
            border: Border {
                color,
                width,
                radius: 2.0.into(),
            },
            ..Default::default()
        }
    }
}

struct Card;

impl container::StyleSheet for Card {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            background: Some(Palette::SURFACE.into()),
            text_color: Some(Palette::ON_SURFACE),
            border: Border {
                color: Palette::PRIMARY,
                width: 1.0,
                radius: 4.0.into(),
            },
            shadow: Default::default(),
        }
    }
}

struct ErrorBanner;

impl container::StyleSheet for ErrorBanner {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            text_color: Some(Palette::ON_PRIMARY),
            background: Some(Palette::ERROR.into()),
            border: Border {
                color: Palette::ERROR,
                width: 1.0,
                radius: 2.0.into(),
            },
            shadow: Default::default(),
        }
    }
}

pub fn button_primary() -> theme::Button {
    theme::Button::Custom(Box::new(PrimaryButton))
}

pub fn tile(selected: bool) -> theme::Button {
    theme::Button::Custom(Box::new(Tile { selected }))
}

/// Container style that mimics Material "cards".
pub fn card() -> theme::Container {
    theme::Container::Custom(Box::new(Card))
}

pub fn error_banner() -> theme::Container {
    theme::Container::Custom(Box::new(ErrorBanner))
}
