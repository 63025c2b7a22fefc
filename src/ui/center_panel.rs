use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::scene::Scene;
use super::app::NarratorApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut NarratorApp) {
    let input_id = egui::Id::new("action_input_box");

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("action_input").show(ctx, |ui| {
        let mut send_now = false;
        let enabled = app.ui.can_act();

        ui.horizontal(|ui| {
            let width = ui.available_width() - 60.0;
            let response = ui.add_enabled(
                enabled,
                egui::TextEdit::multiline(&mut app.ui.input_text)
                    .id(input_id)
                    .desired_rows(2)
                    .desired_width(width)
                    .hint_text("What do you do?"),
            );

            // Enter vs Shift+Enter
            if response.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift)
            {
                send_now = true;
            }

            if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
                send_now = true;
            }
        });

        if send_now {
            let text = app.ui.input_text.trim().to_string();

            if !text.is_empty() {
                app.start_turn(EngineCommand::PlayerAction(text));
                app.ui.input_text.clear();
            }

            ui.memory_mut(|m| m.request_focus(input_id));
        }
    });

    // ---------- Scene ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        if let Some((level, text)) = &app.ui.status {
            ui.colored_label(super::app::status_color(*level), text);
            ui.separator();
        }

        let Some(scene) = app.ui.scene.clone() else {
            draw_welcome(ui, app);
            return;
        };

        egui::ScrollArea::vertical()
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                draw_scene(ui, &scene);

                ui.separator();
                let enabled = app.ui.can_act();
                for choice in &scene.choices {
                    if ui.add_enabled(enabled, egui::Button::new(&choice.text).wrap()).clicked() {
                        app.start_turn(EngineCommand::PlayerAction(choice.text.clone()));
                    }
                }
            });
    });
}

fn draw_welcome(ui: &mut egui::Ui, app: &mut NarratorApp) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading("Dungeon Narrator");
        ui.label("Enter your API key in the Session tab, then start a new adventure.");
        ui.add_space(12.0);

        let enabled = !app.ui.waiting;
        if ui.add_enabled(enabled, egui::Button::new("🎲 Start adventure")).clicked() {
            let s = &app.ui.settings;
            let cmd = EngineCommand::InitializeSession {
                setting: s.story_setting.clone(),
                hero_name: s.hero_name.clone(),
            };
            app.start_turn(cmd);
        }
        if app.ui.waiting {
            ui.spinner();
        }
    });
}

fn draw_scene(ui: &mut egui::Ui, scene: &Scene) {
    if let Some(title) = &scene.title {
        ui.heading(title);
    }
    if let Some(subtitle) = &scene.subtitle {
        ui.label(egui::RichText::new(subtitle).italics().weak());
    }
    ui.add_space(8.0);

    let text = if scene.text.trim().is_empty() { "No data." } else { scene.text.as_str() };
    ui.add(egui::Label::new(egui::RichText::new(text).size(16.0)).wrap());

    for enemy in scene.enemies() {
        ui.add_space(6.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(format!("⚔ {}", enemy.name)).strong());
                if let Some(hp) = &enemy.hp {
                    ui.label(format!("HP {hp}"));
                }
            });
            if !enemy.status.is_empty() {
                ui.label(egui::RichText::new(enemy.status.join(", ")).color(egui::Color32::YELLOW));
            }
        });
    }

    if !scene.abilities.is_empty() {
        ui.add_space(6.0);
        ui.collapsing("Abilities", |ui| {
            for ability in &scene.abilities {
                ui.horizontal(|ui| {
                    ui.label(format!("{} {}", ability.icon, ability.name));
                    if let Some(cost) = &ability.cost {
                        ui.label(egui::RichText::new(cost).weak());
                    }
                    if let Some(usage) = &ability.usage {
                        ui.label(egui::RichText::new(usage).weak());
                    }
                });
                if !ability.desc.is_empty() {
                    ui.label(egui::RichText::new(&ability.desc).small());
                }
            }
        });
    }
}
