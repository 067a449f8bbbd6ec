use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notion text and block colors: the default, nine foreground colors and
/// their nine background counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

/// Palette table mapping every non-default color to its CSS class.
const PALETTE: [(Color, &str); 18] = [
    (Color::Gray, "notion-gray"),
    (Color::Brown, "notion-brown"),
    (Color::Orange, "notion-orange"),
    (Color::Yellow, "notion-yellow"),
    (Color::Green, "notion-green"),
    (Color::Blue, "notion-blue"),
    (Color::Purple, "notion-purple"),
    (Color::Pink, "notion-pink"),
    (Color::Red, "notion-red"),
    (Color::GrayBackground, "notion-gray_background"),
    (Color::BrownBackground, "notion-brown_background"),
    (Color::OrangeBackground, "notion-orange_background"),
    (Color::YellowBackground, "notion-yellow_background"),
    (Color::GreenBackground, "notion-green_background"),
    (Color::BlueBackground, "notion-blue_background"),
    (Color::PurpleBackground, "notion-purple_background"),
    (Color::PinkBackground, "notion-pink_background"),
    (Color::RedBackground, "notion-red_background"),
];

impl std::str::FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Color::Default),
            "gray" => Ok(Color::Gray),
            "brown" => Ok(Color::Brown),
            "orange" => Ok(Color::Orange),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "purple" => Ok(Color::Purple),
            "pink" => Ok(Color::Pink),
            "red" => Ok(Color::Red),
            "gray_background" => Ok(Color::GrayBackground),
            "brown_background" => Ok(Color::BrownBackground),
            "orange_background" => Ok(Color::OrangeBackground),
            "yellow_background" => Ok(Color::YellowBackground),
            "green_background" => Ok(Color::GreenBackground),
            "blue_background" => Ok(Color::BlueBackground),
            "purple_background" => Ok(Color::PurpleBackground),
            "pink_background" => Ok(Color::PinkBackground),
            "red_background" => Ok(Color::RedBackground),
            _ => Err(ValidationError::InvalidColor(s.to_string())),
        }
    }
}

impl Color {
    /// Parses a color name, treating unknown names as uncolored.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            log::debug!("Unknown color '{}', rendering without color", s);
            Color::Default
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
            Color::GrayBackground => "gray_background",
            Color::BrownBackground => "brown_background",
            Color::OrangeBackground => "orange_background",
            Color::YellowBackground => "yellow_background",
            Color::GreenBackground => "green_background",
            Color::BlueBackground => "blue_background",
            Color::PurpleBackground => "purple_background",
            Color::PinkBackground => "pink_background",
            Color::RedBackground => "red_background",
        }
    }

    /// CSS class from the palette table; `None` for the default color.
    pub fn css_class(&self) -> Option<&'static str> {
        PALETTE
            .iter()
            .find(|(color, _)| color == self)
            .map(|(_, class)| *class)
    }

    pub fn is_background(&self) -> bool {
        self.as_str().ends_with("_background")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Color::parse_lenient(&value))
    }
}
