use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::engine::error::GameError;
use crate::engine::llm_client::CompletionClient;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::scene_extractor;
use crate::model::conversation::ConversationHistory;
use crate::model::message::Message;
use crate::model::player::Player;
use crate::model::scene::Scene;

/// Runs conversation turns against a [`CompletionClient`].
///
/// At most one turn is in flight. A turn requested while another one is
/// running fails with [`GameError::ConcurrentTurn`] and makes no request.
/// The history is only written after a turn fully succeeds.
pub struct SceneMediator<C> {
    client: C,
    history: Mutex<ConversationHistory>,
    initialized: AtomicBool,
    busy: AtomicBool,
}

/// Holds the busy flag for the duration of a turn.
struct TurnGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TurnGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GameError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GameError::ConcurrentTurn)?;
        Ok(Self { flag })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct ParsedReply {
    scene: Scene,
    /// The text that actually parsed; this is what goes into the history.
    text: String,
    reformatted: bool,
}

impl<C: CompletionClient> SceneMediator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            history: Mutex::new(ConversationHistory::new()),
            initialized: AtomicBool::new(false),
            busy: AtomicBool::new(false),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn is_session_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn history_snapshot(&self) -> ConversationHistory {
        self.history().clone()
    }

    /// Starts a new session from `[system, user]`.
    ///
    /// On success the history holds exactly `[system, user, assistant]`,
    /// where the assistant entry is the text that parsed.
    pub fn initialize_session(&self, system_prompt: &str, user_prompt: &str) -> Result<Scene, GameError> {
        let _turn = TurnGuard::acquire(&self.busy)?;
        tracing::info!("Initializing session");

        let opening = vec![Message::system(system_prompt), Message::user(user_prompt)];
        let raw = self.request(&opening).inspect_err(|e| {
            tracing::error!("Session initialization failed: {}", e);
        })?;

        let mut seeded = ConversationHistory::new();
        seeded.seed(system_prompt, user_prompt, raw.as_str());

        let parsed = self.parse_or_reformat(&raw, &opening)?;
        if parsed.reformatted {
            seeded.replace_last(parsed.text);
        }

        *self.history() = seeded;
        self.initialized.store(true, Ordering::Release);
        tracing::info!("Session initialized");

        Ok(parsed.scene)
    }

    /// Replays the current transcript and records only the assistant reply.
    pub fn load_scene(&self) -> Result<Scene, GameError> {
        self.require_session()?;
        let _turn = TurnGuard::acquire(&self.busy)?;
        tracing::info!("Loading scene");

        let transcript = self.history().snapshot();
        let raw = self.request(&transcript)?;
        let parsed = self.parse_or_reformat(&raw, &transcript)?;

        self.history().append_assistant(parsed.text);
        Ok(parsed.scene)
    }

    /// Sends the player's action together with their current sheet.
    pub fn send_player_action(&self, action: &str, player: &Player) -> Result<Scene, GameError> {
        self.require_session()?;
        let _turn = TurnGuard::acquire(&self.busy)?;
        tracing::info!("Processing player action: \"{}\"", action);

        let user = PromptBuilder::action_message(action, player);
        let mut transcript = self.history().snapshot();
        transcript.push(Message::user(user.as_str()));

        let raw = self.request(&transcript)?;
        let parsed = self.parse_or_reformat(&raw, &transcript)?;

        self.history().append_turn(user, parsed.text);
        Ok(parsed.scene)
    }

    /// Asks for a prose recap of the session. Does not touch the history.
    pub fn summarize(&self) -> Result<String, GameError> {
        self.require_session()?;
        let _turn = TurnGuard::acquire(&self.busy)?;

        let mut transcript = self.history().snapshot();
        transcript.push(Message::user(PromptBuilder::summary_request()));

        Ok(self.request(&transcript)?.trim().to_string())
    }

    pub fn clear_history(&self) -> Result<(), GameError> {
        let _turn = TurnGuard::acquire(&self.busy)?;
        self.history().reset();
        self.initialized.store(false, Ordering::Release);
        tracing::info!("History cleared");
        Ok(())
    }

    /// Puts a saved transcript back. An empty one leaves the session
    /// uninitialized.
    pub fn restore(&self, history: ConversationHistory) -> Result<(), GameError> {
        let _turn = TurnGuard::acquire(&self.busy)?;
        let active = !history.is_empty();
        *self.history() = history;
        self.initialized.store(active, Ordering::Release);
        Ok(())
    }

    fn require_session(&self) -> Result<(), GameError> {
        if !self.is_session_initialized() {
            tracing::warn!("Turn requested before the session was initialized");
            return Err(GameError::NotInitialized);
        }
        Ok(())
    }

    fn history(&self) -> MutexGuard<'_, ConversationHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(&self, messages: &[Message]) -> Result<String, GameError> {
        let reply = self.client.complete(messages)?;
        tracing::debug!("Received reply ({} chars)", reply.chars().count());
        Ok(reply)
    }

    /// Extracts a scene from `raw`; if that fails, asks the model once to
    /// reformat its answer. There is never a third request.
    fn parse_or_reformat(&self, raw: &str, transcript: &[Message]) -> Result<ParsedReply, GameError> {
        if let Some(scene) = scene_extractor::extract(raw).as_ref().and_then(Scene::from_value) {
            tracing::debug!("Reply parsed directly");
            return Ok(ParsedReply { scene, text: raw.to_string(), reformatted: false });
        }

        tracing::warn!("Reply is not a valid scene, requesting reformat");

        let mut retry = transcript.to_vec();
        retry.push(Message::assistant(raw));
        retry.push(Message::user(PromptBuilder::reformat_instruction()));

        let reformatted = self.request(&retry)?;
        match scene_extractor::extract(&reformatted).as_ref().and_then(Scene::from_value) {
            Some(scene) => {
                tracing::info!("Reply reformatted");
                Ok(ParsedReply { scene, text: reformatted, reformatted: true })
            }
            None => {
                tracing::error!("Reformatted reply is still not a valid scene");
                Err(GameError::SceneFormat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm_client::MockCompletionClient;
    use crate::model::message::Role;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{mpsc, Arc};
    use std::thread;

    const WELCOME: &str = "```json\n{\"text\":\"Welcome\",\"choices\":[{\"id\":\"a\",\"text\":\"Go north\"}]}\n```";
    const NORTH: &str = r#"{"text":"You walk north.","player":{"hp":12}}"#;

    type Calls = Arc<Mutex<Vec<Vec<Message>>>>;

    /// A mock that answers with `replies` in order and records every request.
    fn scripted(replies: Vec<Result<&'static str, GameError>>) -> (MockCompletionClient, Calls) {
        let calls: Calls = Arc::default();
        let recorded = Arc::clone(&calls);
        let count = replies.len();
        let mut replies: VecDeque<_> = replies.into();

        let mut mock = MockCompletionClient::new();
        mock.expect_complete().times(count).returning(move |messages| {
            recorded.lock().unwrap().push(messages.to_vec());
            replies.pop_front().unwrap().map(str::to_string)
        });

        (mock, calls)
    }

    fn active_session() -> SceneMediator<MockCompletionClient> {
        let (mock, _) = scripted(vec![Ok(WELCOME)]);
        let mut mediator = SceneMediator::new(mock);
        mediator.initialize_session("rules", "start").unwrap();
        mediator.client_mut().checkpoint();
        mediator
    }

    fn busy<C>(mediator: &SceneMediator<C>) -> bool {
        mediator.busy.load(Ordering::Acquire)
    }

    fn script(mediator: &mut SceneMediator<MockCompletionClient>, replies: Vec<Result<&'static str, GameError>>) -> Calls {
        let (mock, calls) = scripted(replies);
        *mediator.client_mut() = mock;
        calls
    }

    #[test]
    fn welcome_scenario() {
        let (mock, calls) = scripted(vec![Ok(WELCOME)]);
        let mediator = SceneMediator::new(mock);

        let scene = mediator.initialize_session("P", "start").unwrap();

        assert_eq!(scene.text, "Welcome");
        assert_eq!(scene.choices.len(), 1);
        assert_eq!(scene.choices[0].text, "Go north");
        assert!(mediator.is_session_initialized());
        assert!(!busy(&mediator));

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], vec![Message::system("P"), Message::user("start")]);

        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[2], Message::assistant(WELCOME));
    }

    #[test]
    fn initialize_reformat_sends_seeded_transcript_and_stores_fixed_text() {
        let (mock, calls) = scripted(vec![Ok("Once upon a time..."), Ok(NORTH)]);
        let mediator = SceneMediator::new(mock);

        let scene = mediator.initialize_session("P", "start").unwrap();
        assert_eq!(scene.text, "You walk north.");

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let retry = &calls[1];
        assert_eq!(retry.len(), 4);
        assert_eq!(retry[..3], [
            Message::system("P"),
            Message::user("start"),
            Message::assistant("Once upon a time..."),
        ]);
        assert_eq!(retry[3], Message::user(PromptBuilder::reformat_instruction()));

        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[2], Message::assistant(NORTH));
    }

    #[test]
    fn failed_initialize_leaves_session_empty() {
        let (mock, calls) = scripted(vec![Ok("prose"), Ok("still prose")]);
        let mediator = SceneMediator::new(mock);

        let err = mediator.initialize_session("P", "start").unwrap_err();

        assert!(matches!(err, GameError::SceneFormat));
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert!(!mediator.is_session_initialized());
        assert!(mediator.history_snapshot().is_empty());
        assert!(!busy(&mediator));
    }

    #[test]
    fn action_turn_appends_user_and_assistant() {
        let mut mediator = active_session();
        let calls = script(&mut mediator, vec![Ok(NORTH)]);

        let player = Player::default();
        let scene = mediator.send_player_action("Go north", &player).unwrap();
        assert_eq!(scene.player.and_then(|p| p.hp), Some(12));

        let calls = calls.lock().unwrap();
        let sent = &calls[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3].role, Role::User);
        assert!(sent[3].content.contains("Go north"));
        assert!(sent[3].content.contains(&player.to_json()));

        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 5);
        assert_eq!(history.messages()[3], sent[3]);
        assert_eq!(history.messages()[4], Message::assistant(NORTH));
    }

    #[test]
    fn action_turn_stores_reformatted_text() {
        let mut mediator = active_session();
        let calls = script(&mut mediator, vec![Ok("You walk north, but I forgot JSON."), Ok(NORTH)]);

        mediator.send_player_action("Go north", &Player::default()).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[1].len(), 6);
        assert_eq!(calls[1][4], Message::assistant("You walk north, but I forgot JSON."));

        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 5);
        assert_eq!(history.messages()[4], Message::assistant(NORTH));
    }

    #[test]
    fn double_format_failure_makes_two_calls_and_no_changes() {
        let mut mediator = active_session();
        let before = mediator.history_snapshot();
        let calls = script(&mut mediator, vec![Ok("no json"), Ok("```json\n{broken\n```")]);

        let err = mediator.send_player_action("Go north", &Player::default()).unwrap_err();

        assert!(matches!(err, GameError::SceneFormat));
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(mediator.history_snapshot(), before);
        assert!(mediator.is_session_initialized());
    }

    #[test]
    fn non_object_json_triggers_reformat() {
        let mut mediator = active_session();
        let calls = script(&mut mediator, vec![Ok("[1, 2, 3]"), Ok(NORTH)]);

        let scene = mediator.load_scene().unwrap();

        assert_eq!(scene.text, "You walk north.");
        assert_eq!(calls.lock().unwrap().len(), 2);

        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 4);
        assert_eq!(history.messages()[3], Message::assistant(NORTH));
    }

    #[test]
    fn object_without_text_triggers_reformat() {
        let (mock, calls) = scripted(vec![Ok(r#"{"error":"I cannot continue"}"#), Ok(WELCOME)]);
        let mediator = SceneMediator::new(mock);

        let scene = mediator.initialize_session("P", "start").unwrap();

        assert_eq!(scene.text, "Welcome");
        assert_eq!(calls.lock().unwrap().len(), 2);
        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 3);
        assert_eq!(history.messages()[2], Message::assistant(WELCOME));
    }

    #[test]
    fn object_without_text_twice_is_a_format_error() {
        let mut mediator = active_session();
        let before = mediator.history_snapshot();
        let calls = script(&mut mediator, vec![Ok("{}"), Ok(r#"{"title":"Still no text"}"#)]);

        let err = mediator.send_player_action("Go north", &Player::default()).unwrap_err();

        assert!(matches!(err, GameError::SceneFormat));
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(mediator.history_snapshot(), before);
    }

    #[test]
    fn transport_error_on_reformat_leaves_history_untouched() {
        let mut mediator = active_session();
        let before = mediator.history_snapshot();
        let calls = script(&mut mediator, vec![
            Ok("no json here"),
            Err(GameError::Transport { status: Some(502), body: "bad gateway".into() }),
        ]);

        let err = mediator.send_player_action("Go north", &Player::default()).unwrap_err();

        assert!(matches!(err, GameError::Transport { status: Some(502), .. }));
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(mediator.history_snapshot(), before);
        assert!(mediator.is_session_initialized());
        assert!(!busy(&mediator));
    }

    #[test]
    fn load_scene_replays_transcript_and_records_reply() {
        let mut mediator = active_session();
        let calls = script(&mut mediator, vec![Ok(NORTH)]);

        mediator.load_scene().unwrap();

        assert_eq!(calls.lock().unwrap()[0].len(), 3);
        let history = mediator.history_snapshot();
        assert_eq!(history.len(), 4);
        assert_eq!(history.messages()[3], Message::assistant(NORTH));
    }

    #[test]
    fn transport_error_leaves_history_untouched() {
        let mut mediator = active_session();
        let before = mediator.history_snapshot();
        script(&mut mediator, vec![Err(GameError::Transport { status: Some(500), body: "boom".into() })]);

        let err = mediator.send_player_action("Go north", &Player::default()).unwrap_err();

        assert!(matches!(err, GameError::Transport { status: Some(500), .. }));
        assert_eq!(mediator.history_snapshot(), before);
        assert!(!busy(&mediator));
    }

    #[test]
    fn turns_before_initialization_make_no_request() {
        let mut mock = MockCompletionClient::new();
        mock.expect_complete().never();
        let mediator = SceneMediator::new(mock);

        assert!(matches!(mediator.load_scene(), Err(GameError::NotInitialized)));
        assert!(matches!(
            mediator.send_player_action("wave", &Player::default()),
            Err(GameError::NotInitialized)
        ));
        assert!(matches!(mediator.summarize(), Err(GameError::NotInitialized)));
    }

    #[test]
    fn summarize_does_not_touch_history() {
        let mut mediator = active_session();
        let before = mediator.history_snapshot();
        let calls = script(&mut mediator, vec![Ok("  The hero entered the keep.  ")]);

        assert_eq!(mediator.summarize().unwrap(), "The hero entered the keep.");
        assert_eq!(calls.lock().unwrap()[0].len(), 4);
        assert_eq!(mediator.history_snapshot(), before);
    }

    #[test]
    fn clear_and_restore() {
        let mediator = active_session();
        let saved = mediator.history_snapshot();

        mediator.clear_history().unwrap();
        assert!(!mediator.is_session_initialized());
        assert!(mediator.history_snapshot().is_empty());

        mediator.restore(saved.clone()).unwrap();
        assert!(mediator.is_session_initialized());
        assert_eq!(mediator.history_snapshot(), saved);

        mediator.restore(ConversationHistory::new()).unwrap();
        assert!(!mediator.is_session_initialized());
    }

    /// Blocks inside `complete` until released, so a second turn can be
    /// attempted while the first is in flight.
    struct GatedClient {
        calls: AtomicUsize,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl CompletionClient for GatedClient {
        fn complete(&self, _messages: &[Message]) -> Result<String, GameError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(NORTH.to_string())
        }
    }

    #[test]
    fn second_turn_while_busy_is_rejected_without_request() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let mediator = SceneMediator::new(GatedClient {
            calls: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });

        thread::scope(|s| {
            let first = s.spawn(|| mediator.initialize_session("P", "start"));

            entered_rx.recv().unwrap();
            assert!(busy(&mediator));
            assert!(matches!(
                mediator.initialize_session("P", "again"),
                Err(GameError::ConcurrentTurn)
            ));
            assert!(matches!(mediator.clear_history(), Err(GameError::ConcurrentTurn)));
            assert_eq!(mediator.client().calls.load(Ordering::SeqCst), 1);

            release_tx.send(()).unwrap();
            assert!(first.join().unwrap().is_ok());
        });

        assert!(!busy(&mediator));
        assert_eq!(mediator.history_snapshot().len(), 3);
    }
}
