use std::sync::mpsc::{Receiver, Sender};

use crate::engine::error::GameError;
use crate::engine::llm_client::OpenRouterClient;
use crate::engine::protocol::{EngineCommand, EngineResponse, StatusLevel};
use crate::engine::save_store::{read_save, write_save, SaveStore};
use crate::engine::session::Session;

/// Worker loop. Owns the session and handles one command at a time, so turns
/// never overlap on this side of the channel.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    session: Session<OpenRouterClient>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        client: OpenRouterClient,
        store: SaveStore,
    ) -> Self {
        Self {
            rx,
            tx,
            session: Session::new(client, store),
        }
    }

    pub fn run(&mut self) {
        self.restore_autosave();

        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::InitializeSession { setting, hero_name } => {
                    self.status(
                        StatusLevel::Info,
                        format!(
                            "Initializing session with {}…",
                            self.session.mediator().client().model()
                        ),
                    );
                    let result = self.session.initialize(&setting, &hero_name);
                    self.finish_turn(result, "Session initialized");
                }

                EngineCommand::LoadScene => {
                    self.status(StatusLevel::Info, "Loading scene…");
                    let result = self.session.load_scene();
                    self.finish_turn(result, "Scene loaded");
                }

                EngineCommand::PlayerAction(action) => {
                    self.status(StatusLevel::Info, format!("Sending \"{action}\"…"));
                    let result = self.session.player_action(&action);
                    self.finish_turn(result, "Scene updated");
                }

                EngineCommand::ClearSession { summarize } => {
                    if summarize {
                        self.status(StatusLevel::Info, "Summarizing before clearing…");
                    }
                    match self.session.clear(summarize) {
                        Ok(summary) => {
                            let _ = self.tx.send(EngineResponse::SessionCleared { summary });
                            self.status(StatusLevel::Success, "Session cleared");
                        }
                        Err(err) => self.fail(err),
                    }
                }

                EngineCommand::Configure { base_url, api_key, model } => {
                    tracing::info!("Client configured (model: {})", model);
                    self.session
                        .mediator_mut()
                        .client_mut()
                        .configure(&base_url, &api_key, &model);
                }

                EngineCommand::TestConnection => {
                    match self.session.mediator().client().test_connection() {
                        Ok(text) => self.status(StatusLevel::Success, text),
                        Err(err) => self.status(StatusLevel::Error, err.to_string()),
                    }
                }

                EngineCommand::ExportSave(path) => {
                    match write_save(&path, &self.session.to_save()) {
                        Ok(()) => self.status(
                            StatusLevel::Success,
                            format!("Saved to {}", path.display()),
                        ),
                        Err(err) => self.status(StatusLevel::Error, format!("{err:#}")),
                    }
                }

                EngineCommand::ImportSave(path) => {
                    let result = read_save(&path)
                        .map_err(GameError::from)
                        .and_then(|save| self.session.import(save));
                    self.finish_turn(result, "Game loaded");
                }
            }
        }
    }

    fn restore_autosave(&mut self) {
        match self.session.restore_autosave() {
            Ok(true) => {
                self.send_scene();
                self.status(StatusLevel::Success, "Previous game restored");
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("Ignoring unreadable autosave: {}", err);
                self.status(StatusLevel::Warning, format!("Could not restore game: {err}"));
            }
        }
    }

    fn finish_turn(&self, result: Result<(), GameError>, done: &str) {
        match result {
            Ok(()) => {
                self.send_scene();
                self.status(StatusLevel::Success, done);
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: GameError) {
        let level = match err {
            GameError::ConcurrentTurn | GameError::NotInitialized => StatusLevel::Warning,
            _ => StatusLevel::Error,
        };
        tracing::warn!("Turn failed: {}", err);

        let _ = self.tx.send(EngineResponse::TurnFailed { level, reason: err.to_string() });
    }

    fn send_scene(&self) {
        let _ = self.tx.send(EngineResponse::SceneReady {
            scene: self.session.scene().cloned(),
            player: self.session.player().clone(),
            chat: self.session.chat().to_vec(),
            session_active: self.session.is_active(),
        });
    }

    fn status(&self, level: StatusLevel, text: impl Into<String>) {
        let _ = self.tx.send(EngineResponse::Status { level, text: text.into() });
    }
}
