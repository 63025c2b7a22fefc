use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use crate::engine::engine::Engine;
use crate::engine::llm_client::OpenRouterClient;
use crate::engine::protocol::{EngineCommand, EngineResponse, StatusLevel};
use crate::engine::save_store::SaveStore;
use crate::model::message::ChatLine;
use crate::model::player::Player;
use crate::model::scene::Scene;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::{load_settings, save_settings};
use crate::ui::{center_panel, left_panel, right_panel};

const MAX_LOG_LINES: usize = 100;

/* =========================
   Tabs
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RightTab {
    #[default]
    Session,
    Chat,
    Log,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub settings: UiSettings,
    pub settings_changed: bool,

    pub input_text: String,

    pub scene: Option<Scene>,
    pub player: Player,
    pub chat: Vec<ChatLine>,
    pub session_active: bool,

    /// A turn is in flight; input stays disabled until the engine answers.
    pub waiting: bool,

    pub status: Option<(StatusLevel, String)>,
    pub log: Vec<(StatusLevel, String)>,

    pub should_auto_scroll: bool,
    pub right_tab: RightTab,
}

impl UiState {
    pub fn can_act(&self) -> bool {
        self.session_active && !self.waiting
    }

    fn push_log(&mut self, level: StatusLevel, text: String) {
        self.log.push((level, text));
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }
}

/* =========================
   Theme
   ========================= */

#[derive(Clone)]
pub struct Theme {
    pub player: egui::Color32,
    pub narrator: egui::Color32,
    pub system: egui::Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            player: egui::Color32::from_rgb(40, 70, 120),
            narrator: egui::Color32::from_rgb(40, 90, 60),
            system: egui::Color32::from_rgb(80, 80, 80),
        }
    }
}

pub fn status_color(level: StatusLevel) -> egui::Color32 {
    match level {
        StatusLevel::Info => egui::Color32::GRAY,
        StatusLevel::Success => egui::Color32::LIGHT_GREEN,
        StatusLevel::Warning => egui::Color32::YELLOW,
        StatusLevel::Error => egui::Color32::LIGHT_RED,
    }
}

/* =========================
   App
   ========================= */

pub struct NarratorApp {
    pub ui: UiState,
    pub theme: Theme,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl NarratorApp {
    pub fn new() -> Self {
        let settings = load_settings().with_env_fallback();

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let client = OpenRouterClient::new(&settings.base_url, &settings.api_key, &settings.model);
        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, client, SaveStore::default_location());
            engine.run();
        });

        Self {
            ui: UiState {
                settings,
                ..Default::default()
            },
            theme: Theme::default(),
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Engine thread is gone");
        }
    }

    /// Sends a command that runs a turn. Ignored while another turn is in
    /// flight.
    pub fn start_turn(&mut self, cmd: EngineCommand) {
        if self.ui.waiting {
            return;
        }
        self.ui.waiting = true;
        self.send_command(cmd);
    }

    fn handle_response(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::SceneReady { scene, player, chat, session_active } => {
                self.ui.scene = scene;
                self.ui.player = player;
                self.ui.chat = chat;
                self.ui.session_active = session_active;
                self.ui.waiting = false;
                self.ui.should_auto_scroll = true;
            }
            EngineResponse::TurnFailed { level, reason } => {
                self.ui.waiting = false;
                self.ui.push_log(level, reason.clone());
                self.ui.status = Some((level, reason));
            }
            EngineResponse::SessionCleared { summary } => {
                self.ui.scene = None;
                self.ui.player = Player::default();
                self.ui.chat.clear();
                if let Some(summary) = summary {
                    self.ui.chat.push(ChatLine::System(format!("Previous adventure: {summary}")));
                }
                self.ui.session_active = false;
                self.ui.waiting = false;
            }
            EngineResponse::Status { level, text } => {
                self.ui.push_log(level, text.clone());
                self.ui.status = Some((level, text));
            }
        }
    }

    fn apply_settings(&mut self) {
        if !self.ui.settings_changed {
            return;
        }
        self.ui.settings_changed = false;

        save_settings(&self.ui.settings);
        let s = &self.ui.settings;
        self.send_command(EngineCommand::Configure {
            base_url: s.base_url.clone(),
            api_key: s.api_key.clone(),
            model: s.model.clone(),
        });
    }

    pub fn draw_chat_line(&self, ui: &mut egui::Ui, line: &ChatLine) {
        let (bg, right, text) = match line {
            ChatLine::Player(t) => (self.theme.player, true, format!("You: {t}")),
            ChatLine::Narrator(t) => (self.theme.narrator, false, t.clone()),
            ChatLine::System(t) => (self.theme.system, false, t.clone()),
        };

        ui.add_space(6.0);

        if right {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &text);
            });
        } else {
            bubble(ui, bg, &text);
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for NarratorApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.settings.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle_response(resp);
        }

        left_panel::draw_left_panel(ctx, &self.ui);
        right_panel::draw_right_panel(ctx, self);
        center_panel::draw_center_panel(ctx, self);

        self.apply_settings();
        self.ui.should_auto_scroll = false;

        // The engine answers from another thread and cannot wake egui itself.
        let poll = if self.ui.waiting { 100 } else { 500 };
        ctx.request_repaint_after(Duration::from_millis(poll));
    }
}

/* =========================
   UI Helpers
   ========================= */

pub fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(8)
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.add(egui::Label::new(egui::RichText::new(text).color(egui::Color32::WHITE)).wrap());
        });
}
