//! Core type definitions shared by the database and derivation layers.
//!
//! Enums are serialized in lowercase so they read naturally in TOML and in
//! the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a cropping resize keeps its box along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropAnchor {
    /// Keep the left (horizontal) or top (vertical) edge.
    Start,
    /// Keep the middle.
    #[default]
    Center,
    /// Keep the right (horizontal) or bottom (vertical) edge.
    End,
}

impl CropAnchor {
    /// Offset of a `window`-sized box inside `extent`.
    pub fn offset(&self, extent: u32, window: u32) -> u32 {
        let slack = extent.saturating_sub(window);
        match self {
            Self::Start => 0,
            Self::Center => slack / 2,
            Self::End => slack,
        }
    }
}

impl fmt::Display for CropAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Center => write!(f, "center"),
            Self::End => write!(f, "end"),
        }
    }
}

impl FromStr for CropAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" | "left" | "top" => Ok(Self::Start),
            "center" | "middle" => Ok(Self::Center),
            "end" | "right" | "bottom" => Ok(Self::End),
            other => Err(format!("unknown crop anchor: {}", other)),
        }
    }
}
