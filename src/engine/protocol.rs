use std::path::PathBuf;

use crate::model::message::ChatLine;
use crate::model::player::Player;
use crate::model::scene::Scene;

pub enum EngineCommand {
    InitializeSession {
        setting: String,
        hero_name: String,
    },
    LoadScene,
    PlayerAction(String),
    ClearSession {
        summarize: bool,
    },
    Configure {
        base_url: String,
        api_key: String,
        model: String,
    },
    TestConnection,
    ExportSave(PathBuf),
    ImportSave(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub enum EngineResponse {
    /// Full view of the game after a successful turn or a restore.
    SceneReady {
        scene: Option<Scene>,
        player: Player,
        chat: Vec<ChatLine>,
        session_active: bool,
    },

    /// The turn ended without changing the game.
    TurnFailed {
        level: StatusLevel,
        reason: String,
    },

    SessionCleared {
        summary: Option<String>,
    },

    Status {
        level: StatusLevel,
        text: String,
    },
}
