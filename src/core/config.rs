use serde::{Deserialize, Serialize};

/// System-instruction context used when the user has not customized it.
pub const DEFAULT_CONTEXT: &str =
    "You are a helpful AI assistant specializing in code generation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// User settings persisted as a single JSON value in the store.
///
/// `persona` and `context` feed the system instruction sent with every chat
/// request; see [`crate::core::conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: Theme,
    #[serde(default)]
    pub persona: String,
    #[serde(default = "default_context")]
    pub context: String,
}

fn default_theme() -> Theme {
    Theme::Dark
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            persona: String::new(),
            context: DEFAULT_CONTEXT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.persona.is_empty());
        assert_eq!(settings.context, DEFAULT_CONTEXT);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.context, DEFAULT_CONTEXT);
    }

    #[test]
    fn theme_serializes_lowercase() {
        let json = serde_json::to_string(&Theme::Dark).unwrap();
        assert_eq!(json, r#""dark""#);
    }
}
