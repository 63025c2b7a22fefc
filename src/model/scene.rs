use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::player::PlayerDelta;

/// One structured narrative unit returned by the model.
///
/// Only `text` is always present. Everything else is optional and means
/// "keep what you had" when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsPanel>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy: Option<EnemySlot>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPanel {
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub icons: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    #[serde(default)]
    pub icon: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    #[serde(default, deserialize_with = "loose_string", skip_serializing_if = "Option::is_none")]
    pub hp: Option<String>,
    #[serde(default)]
    pub status: Vec<String>,
}

/// The model sends either one enemy or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnemySlot {
    One(Enemy),
    Many(Vec<Enemy>),
}

impl EnemySlot {
    pub fn enemies(&self) -> &[Enemy] {
        match self {
            EnemySlot::One(enemy) => std::slice::from_ref(enemy),
            EnemySlot::Many(list) => list,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(deserialize_with = "required_loose_string")]
    pub id: String,
    pub text: String,
}

impl Scene {
    /// Validates untrusted extractor output field by field.
    ///
    /// Returns `None` when the value is not a JSON object or has no string
    /// `text`. Other mistyped fields and list entries are dropped with a
    /// warning.
    pub fn from_value(value: &Value) -> Option<Scene> {
        let map = value.as_object()?;
        let Some(text) = string_field(map, "text") else {
            tracing::debug!("Scene object has no text");
            return None;
        };

        let enemy = match map.get("enemy") {
            None | Some(Value::Null) => None,
            Some(v) => decode_field::<EnemySlot>("enemy", v),
        };

        Some(Scene {
            title: string_field(map, "title"),
            subtitle: string_field(map, "subtitle"),
            text,
            player: map.get("player").and_then(PlayerDelta::from_value),
            stats: map.get("stats").and_then(|v| decode_field("stats", v)),
            abilities: list_field(map, "abilities"),
            enemy,
            choices: list_field(map, "choices"),
        })
    }

    pub fn enemies(&self) -> &[Enemy] {
        self.enemy.as_ref().map(EnemySlot::enemies).unwrap_or(&[])
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn decode_field<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!("Dropping scene field '{}': {}", key, err);
            None
        }
    }
}

fn list_field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Vec<T> {
    let Some(Value::Array(items)) = map.get(key) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| decode_field(key, item))
        .collect()
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    loose_string(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_scene_decodes() {
        let scene = Scene::from_value(&json!({
            "title": "The Gate",
            "subtitle": "Chapter 1",
            "text": "A cold wind.",
            "player": {"name": "Aria", "hp": 20},
            "stats": {"visible": true, "icons": ["a","b","c","d","e","f"], "labels": ["1","2","3","4","5","6"]},
            "abilities": [{"icon": "⚔️", "name": "Attack", "desc": "Damage: 5", "cost": 2}],
            "enemy": {"name": "Goblin", "hp": 7, "status": ["weakened"]},
            "choices": [{"id": "a", "text": "Fight"}, {"id": 2, "text": "Flee"}]
        }))
        .unwrap();

        assert_eq!(scene.title.as_deref(), Some("The Gate"));
        assert_eq!(scene.player.as_ref().unwrap().hp, Some(20));
        assert_eq!(scene.abilities[0].cost.as_deref(), Some("2"));
        assert_eq!(scene.enemies()[0].hp.as_deref(), Some("7"));
        assert_eq!(scene.choices[1].id, "2");
        assert!(scene.stats.unwrap().visible);
    }

    #[test]
    fn enemy_list_and_null() {
        let many = Scene::from_value(&json!({
            "text": "Ambush",
            "enemy": [{"name": "Wolf", "hp": "5/8"}, {"name": "Wolf", "hp": 8}]
        }))
        .unwrap();
        assert_eq!(many.enemies().len(), 2);

        let none = Scene::from_value(&json!({"text": "Quiet", "enemy": null})).unwrap();
        assert!(none.enemies().is_empty());
    }

    #[test]
    fn bad_entries_are_dropped_not_fatal() {
        let scene = Scene::from_value(&json!({
            "text": "Crossroads",
            "choices": [{"id": "a", "text": "Left"}, {"text": "no id"}, "garbage"],
            "abilities": "not a list",
            "stats": 5
        }))
        .unwrap();

        assert_eq!(scene.choices.len(), 1);
        assert!(scene.abilities.is_empty());
        assert!(scene.stats.is_none());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(Scene::from_value(&json!([1, 2, 3])).is_none());
        assert!(Scene::from_value(&json!("text")).is_none());
    }

    #[test]
    fn missing_or_mistyped_text_is_rejected() {
        assert!(Scene::from_value(&json!({"title": "Only a title"})).is_none());
        assert!(Scene::from_value(&json!({"error": "I cannot continue"})).is_none());
        assert!(Scene::from_value(&json!({"text": 42})).is_none());
        assert!(Scene::from_value(&json!({"text": ""})).is_some());
    }
}
