use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marker the dark theme places on the document root.
pub const DARK_MARKER: &str = "dark";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation markers set on the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRoot {
    markers: BTreeSet<String>,
}

impl DocumentRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_theme(&mut self, theme: Theme) {
        match theme {
            Theme::Dark => {
                self.markers.insert(DARK_MARKER.to_string());
            }
            Theme::Light => {
                self.markers.remove(DARK_MARKER);
            }
        }
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    pub fn add_marker(&mut self, marker: impl Into<String>) {
        self.markers.insert(marker.into());
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }
}
