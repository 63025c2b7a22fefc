use std::fs;
use std::path::{Path, PathBuf};

use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dungeon_narrator");
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    load_settings_from(&settings_path())
}

pub fn save_settings(settings: &UiSettings) {
    if let Err(err) = save_settings_to(&settings_path(), settings) {
        tracing::warn!("Could not save settings: {:#}", err);
    }
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings_from(path: &Path) -> UiSettings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str::<UiSettings>(&s).ok())
        .unwrap_or_default()
        .sanitized()
}

pub fn save_settings_to(path: &Path, settings: &UiSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::settings::MIN_UI_SCALE;

    #[test]
    fn settings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("ui_settings.json");

        assert_eq!(load_settings_from(&path), UiSettings::default());

        let settings = UiSettings {
            api_key: "sk-test".into(),
            hero_name: "Aria".into(),
            summarize_on_clear: true,
            ..Default::default()
        };
        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_settings.json");
        fs::write(&path, "][").unwrap();

        assert_eq!(load_settings_from(&path), UiSettings::default());
    }

    #[test]
    fn hand_edited_scale_is_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_settings.json");
        fs::write(&path, r#"{"ui_scale": 0.0, "api_key": "k"}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.ui_scale, MIN_UI_SCALE);
        assert_eq!(settings.api_key, "k");
    }
}
