use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six ability scores, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Stat {
    pub const ALL: [Stat; 6] = [Stat::Str, Stat::Dex, Stat::Con, Stat::Int, Stat::Wis, Stat::Cha];
}

pub const DEFAULT_SCORE: i64 = 10;
pub const DEFAULT_NAME: &str = "Hero";

/// Partial player record carried by a scene. Absent fields leave the
/// current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "str", default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<i64>,
    #[serde(rename = "dex", default, skip_serializing_if = "Option::is_none")]
    pub dexterity: Option<i64>,
    #[serde(rename = "con", default, skip_serializing_if = "Option::is_none")]
    pub constitution: Option<i64>,
    #[serde(rename = "int", default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<i64>,
    #[serde(rename = "wis", default, skip_serializing_if = "Option::is_none")]
    pub wisdom: Option<i64>,
    #[serde(rename = "cha", default, skip_serializing_if = "Option::is_none")]
    pub charisma: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abilities: Option<Vec<Value>>,
}

impl PlayerDelta {
    /// Reads a delta out of untrusted model output one field at a time.
    /// Fields of the wrong type are dropped instead of failing the whole delta.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        let int = |key: &str| {
            map.get(key).and_then(|v| {
                v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))
            })
        };
        let list = |key: &str| map.get(key).and_then(Value::as_array).cloned();

        Some(Self {
            name: map.get("name").and_then(Value::as_str).map(str::to_string),
            strength: int("str"),
            dexterity: int("dex"),
            constitution: int("con"),
            intelligence: int("int"),
            wisdom: int("wis"),
            charisma: int("cha"),
            hp: int("hp"),
            mp: int("mp"),
            gold: int("gold"),
            inventory: list("inventory"),
            abilities: list("abilities"),
        })
    }
}

/// Authoritative character state on the client side.
///
/// Field order matches the serialization sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub hp: Option<i64>,
    pub mp: Option<i64>,
    #[serde(rename = "str")]
    pub strength: i64,
    #[serde(rename = "dex")]
    pub dexterity: i64,
    #[serde(rename = "con")]
    pub constitution: i64,
    #[serde(rename = "int")]
    pub intelligence: i64,
    #[serde(rename = "wis")]
    pub wisdom: i64,
    #[serde(rename = "cha")]
    pub charisma: i64,
    pub inventory: Vec<Value>,
    pub abilities: Vec<Value>,
    pub gold: i64,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            hp: None,
            mp: None,
            strength: DEFAULT_SCORE,
            dexterity: DEFAULT_SCORE,
            constitution: DEFAULT_SCORE,
            intelligence: DEFAULT_SCORE,
            wisdom: DEFAULT_SCORE,
            charisma: DEFAULT_SCORE,
            inventory: Vec::new(),
            abilities: Vec::new(),
            gold: 0,
        }
    }
}

impl Player {
    /// Shallow merge. Values from the scene are trusted as absolute and are
    /// not clamped.
    pub fn update(&mut self, delta: &PlayerDelta) -> &mut Self {
        fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        merge(&mut self.name, &delta.name);
        merge(&mut self.strength, &delta.strength);
        merge(&mut self.dexterity, &delta.dexterity);
        merge(&mut self.constitution, &delta.constitution);
        merge(&mut self.intelligence, &delta.intelligence);
        merge(&mut self.wisdom, &delta.wisdom);
        merge(&mut self.charisma, &delta.charisma);
        merge(&mut self.gold, &delta.gold);
        merge(&mut self.inventory, &delta.inventory);
        merge(&mut self.abilities, &delta.abilities);

        if delta.hp.is_some() {
            self.hp = delta.hp;
        }
        if delta.mp.is_some() {
            self.mp = delta.mp;
        }

        self
    }

    pub fn score(&self, stat: Stat) -> i64 {
        match stat {
            Stat::Str => self.strength,
            Stat::Dex => self.dexterity,
            Stat::Con => self.constitution,
            Stat::Int => self.intelligence,
            Stat::Wis => self.wisdom,
            Stat::Cha => self.charisma,
        }
    }

    pub fn modifier(&self, stat: Stat) -> i64 {
        (self.score(stat) - 10).div_euclid(2)
    }

    pub fn total_stat(&self, stat: Stat) -> i64 {
        self.score(stat) + self.modifier(stat)
    }

    pub fn add_item(&mut self, item: Value) {
        self.inventory.push(item);
    }

    pub fn remove_item(&mut self, name: &str) {
        self.inventory.retain(|item| entry_name(item) != Some(name));
    }

    pub fn add_ability(&mut self, ability: Value) {
        self.abilities.push(ability);
    }

    pub fn remove_ability(&mut self, name: &str) {
        self.abilities.retain(|ability| entry_name(ability) != Some(name));
    }

    pub fn change_hp(&mut self, amount: i64) -> i64 {
        let hp = (self.hp.unwrap_or(0) + amount).max(0);
        self.hp = Some(hp);
        hp
    }

    pub fn change_mp(&mut self, amount: i64) -> i64 {
        let mp = (self.mp.unwrap_or(0) + amount).max(0);
        self.mp = Some(mp);
        mp
    }

    pub fn change_gold(&mut self, amount: i64) -> i64 {
        self.gold = (self.gold + amount).max(0);
        self.gold
    }

    pub fn is_alive(&self) -> bool {
        self.hp.unwrap_or(0) > 0
    }

    /// Canonical serialization embedded in every action message.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Inventory and ability entries are either plain strings or objects with a
/// `name` field.
pub fn entry_name(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }
}
