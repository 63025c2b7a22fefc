use crate::model::player::Player;

/// Formats every piece of text the engine sends to the model.
/// No parsing, no networking: only strings.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn system_prompt() -> String {
        let mut prompt = String::new();

        push_role(&mut prompt);
        push_scene_schema(&mut prompt);
        push_output_rules(&mut prompt);

        prompt
    }

    pub fn opening_prompt(setting: &str, hero_name: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "Create an introductory scene for a new D&D character. \
             Start with character creation and the first scene of the adventure.\n",
        );

        if !setting.trim().is_empty() {
            prompt.push_str("\nSETTING AND BACKSTORY:\n");
            prompt.push_str(setting.trim());
            prompt.push('\n');
        }

        if !hero_name.trim().is_empty() {
            prompt.push_str(&format!("\nThe hero's name is {}.\n", hero_name.trim()));
        }

        prompt
    }

    /// The player's action plus the full character sheet, so the model keeps
    /// the same ground truth as the client.
    pub fn action_message(action: &str, player: &Player) -> String {
        format!(
            "The player chose: {}. Current character state: {}. Create the next scene based on this choice.",
            action,
            player.to_json()
        )
    }

    pub fn reformat_instruction() -> String {
        "Reformat your previous answer as valid JSON matching the D&D scene schema. \
         Reply with the JSON object only, without markdown."
            .to_string()
    }

    pub fn summary_request() -> String {
        "Pause the game. In a few sentences of plain prose (no JSON), summarize the adventure \
         so far: where the hero is, what happened, and what remains unresolved."
            .to_string()
    }
}

fn push_role(prompt: &mut String) {
    prompt.push_str("You are the Dungeon Master (DM) of a D&D game. Your job:\n");
    prompt.push_str("1. Create engaging scenes as JSON\n");
    prompt.push_str("2. Answer the player's choices with new scenes\n");
    prompt.push_str("3. Keep track of the character's stats, hit points, gold and inventory\n\n");
}

fn push_scene_schema(prompt: &mut String) {
    prompt.push_str("SCENE FORMAT (JSON):\n");
    prompt.push_str(
        r#"{
  "title": "Scene title",
  "subtitle": "Subtitle",
  "text": "Atmospheric description of the scene",
  "choices": [
    {"id": "choice1", "text": "Description of the choice"}
  ],
  "player": {
    "name": "Character name",
    "str": 15, "dex": 12, "con": 14, "int": 10, "wis": 13, "cha": 11,
    "hp": 20, "mp": 10, "gold": 100,
    "inventory": ["Item"],
    "abilities": ["Ability"]
  },
  "stats": {
    "visible": true,
    "icons": ["💪", "🤸", "🛡️", "🧠", "🦉", "🎭"],
    "labels": ["Strength", "Dexterity", "Constitution", "Intelligence", "Wisdom", "Charisma"]
  },
  "abilities": [
    {"icon": "⚔️", "name": "Attack", "desc": "Damage: 5", "cost": "1 action"}
  ],
  "enemy": {"name": "Enemy name", "hp": 12, "status": ["weakened"]}
}
"#,
    );
    prompt.push('\n');
}

fn push_output_rules(prompt: &mut String) {
    prompt.push_str("RULES:\n");
    prompt.push_str("- Only \"text\" is required; omit fields that did not change.\n");
    prompt.push_str("- \"enemy\" may be one object, a list, or null when there is no fight.\n");
    prompt.push_str("- Player values are absolute, not deltas.\n\n");
    prompt.push_str("Answer with JSON of the structure above, without markdown.\n");
}
