use std::collections::BTreeMap;

use indexmap::IndexMap;

/// Colour for labels the palette does not know.
pub const FALLBACK_COLOR: &str = "#9E9E9E";

const DEFAULT_COLORS: [(&str, &str); 7] = [
    ("joy", "#FFD93D"),
    ("love", "#FF8FAB"),
    ("surprise", "#4ECDC4"),
    ("neutral", "#B8B8B8"),
    ("fear", "#9B72CF"),
    ("sadness", "#6C9BCF"),
    ("anger", "#FF6B6B"),
];

/// Stable label -> colour assignments for emotion charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionPalette {
    colors: IndexMap<String, String>,
}

impl EmotionPalette {
    pub fn contains(&self, label: &str) -> bool {
        self.colors.contains_key(label)
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors
            .iter()
            .map(|(label, color)| (label.as_str(), color.as_str()))
    }

    pub fn color_for(&self, label: &str) -> &str {
        self.colors
            .get(label)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }

    /// Applies user overrides on top of the defaults. Entries that are not a
    /// `#RRGGBB` colour are skipped with a warning.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (label, color) in overrides {
            let label = label.trim().to_lowercase();
            if label.is_empty() {
                continue;
            }
            if !is_hex_color(color) {
                tracing::warn!(%label, %color, "ignoring palette override that is not #RRGGBB");
                continue;
            }
            self.colors.insert(label, color.to_uppercase());
        }
        self
    }
}

impl Default for EmotionPalette {
    fn default() -> Self {
        let colors = DEFAULT_COLORS
            .into_iter()
            .map(|(label, color)| (label.to_string(), color.to_string()))
            .collect();
        Self { colors }
    }
}

fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|ch| ch.is_ascii_hexdigit())
}
