use serde::{Deserialize, Serialize};

use crate::model::conversation::ConversationHistory;
use crate::model::message::ChatLine;
use crate::model::player::Player;
use crate::model::scene::Scene;

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSave {
    pub version: u32,
    pub player: Player,
    pub history: ConversationHistory,
    pub chat: Vec<ChatLine>,
    pub scene: Option<Scene>,
}

impl GameSave {
    pub fn new(
        player: Player,
        history: ConversationHistory,
        chat: Vec<ChatLine>,
        scene: Option<Scene>,
    ) -> Self {
        Self {
            version: SAVE_VERSION,
            player,
            history,
            chat,
            scene,
        }
    }
}
