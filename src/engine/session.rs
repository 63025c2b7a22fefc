use crate::engine::error::GameError;
use crate::engine::llm_client::CompletionClient;
use crate::engine::mediator::SceneMediator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::save_store::SaveStore;
use crate::model::game_save::GameSave;
use crate::model::message::ChatLine;
use crate::model::player::Player;
use crate::model::scene::Scene;

/// Everything one game owns: the transcript (inside the mediator), the
/// player sheet, the readable chat and the last scene.
pub struct Session<C> {
    mediator: SceneMediator<C>,
    player: Player,
    chat: Vec<ChatLine>,
    scene: Option<Scene>,
    store: SaveStore,
}

impl<C: CompletionClient> Session<C> {
    pub fn new(client: C, store: SaveStore) -> Self {
        Self {
            mediator: SceneMediator::new(client),
            player: Player::default(),
            chat: Vec::new(),
            scene: None,
            store,
        }
    }

    pub fn mediator(&self) -> &SceneMediator<C> {
        &self.mediator
    }

    pub fn mediator_mut(&mut self) -> &mut SceneMediator<C> {
        &mut self.mediator
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn chat(&self) -> &[ChatLine] {
        &self.chat
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.mediator.is_session_initialized()
    }

    /// Loads the autosave, if there is one. Returns whether a game came back.
    pub fn restore_autosave(&mut self) -> Result<bool, GameError> {
        match self.store.load()? {
            Some(save) => {
                self.restore(save)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn restore(&mut self, save: GameSave) -> Result<(), GameError> {
        self.mediator.restore(save.history)?;
        self.player = save.player;
        self.chat = save.chat;
        self.scene = save.scene;
        tracing::info!("Restored game ({} chat lines)", self.chat.len());
        Ok(())
    }

    /// Replaces the current game with an imported one and makes it the
    /// autosave.
    pub fn import(&mut self, save: GameSave) -> Result<(), GameError> {
        self.restore(save)?;
        self.autosave();
        Ok(())
    }

    pub fn to_save(&self) -> GameSave {
        GameSave::new(
            self.player.clone(),
            self.mediator.history_snapshot(),
            self.chat.clone(),
            self.scene.clone(),
        )
    }

    pub fn initialize(&mut self, setting: &str, hero_name: &str) -> Result<(), GameError> {
        let scene = self.mediator.initialize_session(
            &PromptBuilder::system_prompt(),
            &PromptBuilder::opening_prompt(setting, hero_name),
        )?;

        self.player = Player::default();
        if !hero_name.trim().is_empty() {
            self.player.name = hero_name.trim().to_string();
        }
        self.chat.clear();
        self.accept(scene);
        Ok(())
    }

    pub fn load_scene(&mut self) -> Result<(), GameError> {
        let scene = self.mediator.load_scene()?;
        self.accept(scene);
        Ok(())
    }

    pub fn player_action(&mut self, action: &str) -> Result<(), GameError> {
        let scene = self.mediator.send_player_action(action, &self.player)?;
        self.chat.push(ChatLine::Player(action.to_string()));
        self.accept(scene);
        Ok(())
    }

    /// Ends the game. With `summarize`, the model is asked for a recap first;
    /// a failed recap does not stop the clear.
    pub fn clear(&mut self, summarize: bool) -> Result<Option<String>, GameError> {
        let summary = if summarize && self.is_active() {
            match self.mediator.summarize() {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::warn!("Summary before clear failed: {}", err);
                    None
                }
            }
        } else {
            None
        };

        self.mediator.clear_history()?;
        self.player = Player::default();
        self.chat.clear();
        self.scene = None;

        if let Err(err) = self.store.clear() {
            tracing::warn!("Could not remove autosave: {:#}", err);
        }

        Ok(summary)
    }

    fn accept(&mut self, scene: Scene) {
        if let Some(delta) = &scene.player {
            self.player.update(delta);
        }
        if !scene.text.trim().is_empty() {
            self.chat.push(ChatLine::Narrator(scene.text.clone()));
        }
        self.scene = Some(scene);
        self.autosave();
    }

    fn autosave(&self) {
        if let Err(err) = self.store.save(&self.to_save()) {
            tracing::warn!("Autosave failed: {:#}", err);
        }
    }
}
