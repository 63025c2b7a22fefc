use eframe::egui;

use crate::engine::protocol::EngineCommand;
use super::app::{status_color, NarratorApp, RightTab};
use super::settings::{MAX_UI_SCALE, MIN_UI_SCALE};

pub fn draw_right_panel(ctx: &egui::Context, app: &mut NarratorApp) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(340.0)
        .min_width(260.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut app.ui.right_tab, RightTab::Session, "Session");
                ui.selectable_value(&mut app.ui.right_tab, RightTab::Chat, "Chat");
                ui.selectable_value(&mut app.ui.right_tab, RightTab::Log, "Log");
            });

            ui.separator();

            match app.ui.right_tab {
                RightTab::Session => {
                    egui::ScrollArea::vertical().show(ui, |ui| draw_session(ui, app));
                }
                RightTab::Chat => draw_chat(ui, app),
                RightTab::Log => draw_log(ui, app),
            }
        });
}

/* =========================
   Session & settings
   ========================= */

fn draw_session(ui: &mut egui::Ui, app: &mut NarratorApp) {
    let mut changed = false;
    let s = &mut app.ui.settings;

    ui.heading("Connection");

    ui.label("API key");
    changed |= ui.add(egui::TextEdit::singleline(&mut s.api_key).password(true)).changed();

    ui.label("Model");
    changed |= ui.text_edit_singleline(&mut s.model).changed();

    ui.collapsing("Endpoint", |ui| {
        changed |= ui.text_edit_singleline(&mut s.base_url).changed();
    });

    ui.separator();
    ui.heading("Adventure");

    ui.label("Hero name");
    changed |= ui.text_edit_singleline(&mut s.hero_name).changed();

    ui.label("Setting & backstory");
    changed |= ui
        .add(
            egui::TextEdit::multiline(&mut s.story_setting)
                .desired_rows(5)
                .hint_text("A drowned city ruled by a lich…"),
        )
        .changed();

    changed |= ui.checkbox(&mut s.summarize_on_clear, "Summarize before clearing").changed();

    ui.separator();
    ui.label("UI Scale");
    changed |= ui.add(egui::Slider::new(&mut s.ui_scale, MIN_UI_SCALE..=MAX_UI_SCALE)).changed();

    if changed {
        app.ui.settings_changed = true;
    }

    ui.separator();
    draw_session_buttons(ui, app);
}

fn draw_session_buttons(ui: &mut egui::Ui, app: &mut NarratorApp) {
    let idle = !app.ui.waiting;

    ui.horizontal_wrapped(|ui| {
        if ui.add_enabled(idle, egui::Button::new("🎲 New session")).clicked() {
            let s = &app.ui.settings;
            let cmd = EngineCommand::InitializeSession {
                setting: s.story_setting.clone(),
                hero_name: s.hero_name.clone(),
            };
            app.start_turn(cmd);
        }

        if ui.add_enabled(app.ui.can_act(), egui::Button::new("📜 Load scene")).clicked() {
            app.start_turn(EngineCommand::LoadScene);
        }

        if ui.add_enabled(idle, egui::Button::new("🗑 Clear session")).clicked() {
            let summarize = app.ui.settings.summarize_on_clear;
            app.start_turn(EngineCommand::ClearSession { summarize });
        }
    });

    ui.horizontal_wrapped(|ui| {
        if ui.button("🔌 Test connection").clicked() {
            app.send_command(EngineCommand::TestConnection);
        }

        if ui.add_enabled(idle, egui::Button::new("💾 Export…")).clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Game save", &["json"])
                .set_file_name("dungeon_save.json")
                .save_file()
            {
                app.send_command(EngineCommand::ExportSave(path));
            }
        }

        if ui.add_enabled(idle, egui::Button::new("📂 Import…")).clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Game save", &["json"])
                .pick_file()
            {
                app.start_turn(EngineCommand::ImportSave(path));
            }
        }
    });

    if app.ui.waiting {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Waiting for the narrator…");
        });
    }
}

/* =========================
   Chat & log
   ========================= */

fn draw_chat(ui: &mut egui::Ui, app: &NarratorApp) {
    egui::ScrollArea::vertical()
        .stick_to_bottom(app.ui.should_auto_scroll)
        .show(ui, |ui| {
            if app.ui.chat.is_empty() {
                ui.label("Nothing said yet.");
            }
            for line in &app.ui.chat {
                app.draw_chat_line(ui, line);
            }
        });
}

fn draw_log(ui: &mut egui::Ui, app: &mut NarratorApp) {
    if ui.small_button("Clear log").clicked() {
        app.ui.log.clear();
    }
    ui.separator();

    egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
        for (level, text) in &app.ui.log {
            ui.colored_label(status_color(*level), text);
        }
    });
}
