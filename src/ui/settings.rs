use serde::{Deserialize, Serialize};

use crate::engine::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const MODEL_ENV: &str = "OPENROUTER_MODEL";

pub const MIN_UI_SCALE: f32 = 0.75;
pub const MAX_UI_SCALE: f32 = 2.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    pub api_key: String,
    pub model: String,
    pub base_url: String,

    /// Free-text world and backstory sent with the opening prompt.
    pub story_setting: String,
    pub hero_name: String,

    pub summarize_on_clear: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            story_setting: String::new(),
            hero_name: String::new(),
            summarize_on_clear: false,
        }
    }
}

impl UiSettings {
    /// Pulls hand-edited values back into the range the UI accepts.
    pub fn sanitized(mut self) -> Self {
        self.ui_scale = if self.ui_scale.is_finite() {
            self.ui_scale.clamp(MIN_UI_SCALE, MAX_UI_SCALE)
        } else {
            1.0
        };
        self
    }

    /// Fills an empty key or model from the environment.
    pub fn with_env_fallback(mut self) -> Self {
        self.apply_env(std::env::var(API_KEY_ENV).ok(), std::env::var(MODEL_ENV).ok());
        self
    }

    fn apply_env(&mut self, api_key: Option<String>, model: Option<String>) {
        if self.api_key.trim().is_empty() {
            if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
                self.api_key = key;
            }
        }
        if self.model.trim().is_empty() {
            self.model = model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.into());
        }
    }
}
