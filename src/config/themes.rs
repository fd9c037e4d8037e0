use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "default";

/// Colour table for one theme, stored as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub primary: String,
    pub secondary: String,
    pub danger: String,
    pub warning: String,
    pub success: String,
    pub info: String,
    pub priority_none: String,
    pub priority_low: String,
    pub priority_medium: String,
    pub priority_high: String,
}

impl ThemePalette {
    #[allow(clippy::too_many_arguments)]
    fn from_hex(
        primary: &str,
        secondary: &str,
        danger: &str,
        warning: &str,
        success: &str,
        info: &str,
        priority_none: &str,
        priority_low: &str,
        priority_medium: &str,
        priority_high: &str,
    ) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            danger: danger.to_string(),
            warning: warning.to_string(),
            success: success.to_string(),
            info: info.to_string(),
            priority_none: priority_none.to_string(),
            priority_low: priority_low.to_string(),
            priority_medium: priority_medium.to_string(),
            priority_high: priority_high.to_string(),
        }
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::from_hex(
            "#6ee7b7", "#c4b5fd", "#fb7185", "#fcd34d", "#bef264", "#93c5fd", "#ffffff",
            "#93c5fd", "#fef08a", "#f87171",
        )
    }
}

/// Named palettes in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRegistry {
    palettes: IndexMap<String, ThemePalette>,
}

impl ThemeRegistry {
    pub fn new(palettes: IndexMap<String, ThemePalette>) -> Self {
        Self { palettes }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.palettes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }

    pub fn palettes(&self) -> &IndexMap<String, ThemePalette> {
        &self.palettes
    }

    pub fn into_palettes(self) -> IndexMap<String, ThemePalette> {
        self.palettes
    }

    /// Unknown names fall back to the built-in default palette.
    pub fn resolve(&self, name: &str) -> ThemePalette {
        match self.palettes.get(name) {
            Some(palette) => palette.clone(),
            None => {
                tracing::warn!(theme = name, "unknown theme, falling back to default");
                self.palettes
                    .get(DEFAULT_THEME)
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (DEFAULT_THEME, ThemePalette::default()),
            (
                "dark",
                ThemePalette::from_hex(
                    "#10b981", "#8b5cf6", "#ef4444", "#f59e0b", "#84cc16", "#3b82f6", "#d1d5db",
                    "#60a5fa", "#fbbf24", "#f87171",
                ),
            ),
            (
                "nord",
                ThemePalette::from_hex(
                    "#88c0d0", "#b48ead", "#bf616a", "#ebcb8b", "#a3be8c", "#81a1c1", "#4c566a",
                    "#5e81ac", "#ebcb8b", "#bf616a",
                ),
            ),
            (
                "gruvbox",
                ThemePalette::from_hex(
                    "#83a598", "#d3869b", "#fb4934", "#fabd2f", "#b8bb26", "#8ec07c", "#a89984",
                    "#83a598", "#fabd2f", "#fb4934",
                ),
            ),
            (
                "dracula",
                ThemePalette::from_hex(
                    "#50fa7b", "#bd93f9", "#ff5555", "#f1fa8c", "#50fa7b", "#8be9fd", "#f8f8f2",
                    "#8be9fd", "#f1fa8c", "#ff5555",
                ),
            ),
        ]
        .into_iter()
        .map(|(name, palette)| (name.to_string(), palette))
        .collect();
        Self { palettes }
    }
}

#[cfg(test)]
mod tests {
    use super::{ThemeRegistry, DEFAULT_THEME};

    #[test]
    fn builtin_registry_keeps_declaration_order() {
        let registry = ThemeRegistry::default();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["default", "dark", "nord", "gruvbox", "dracula"]);
    }

    #[test]
    fn unknown_theme_resolves_to_default() {
        let registry = ThemeRegistry::default();
        assert!(!registry.contains("solarized"));
        assert_eq!(
            registry.resolve("solarized"),
            registry.resolve(DEFAULT_THEME)
        );
        assert_eq!(registry.resolve("nord").primary, "#88c0d0");
    }
}
