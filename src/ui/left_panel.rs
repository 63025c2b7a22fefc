use eframe::egui;
use serde_json::Value;

use crate::model::player::{entry_name, Player, Stat};
use crate::model::scene::StatsPanel;
use crate::ui::app::UiState;

pub const DEFAULT_STAT_ICONS: [&str; 6] = ["💪", "🤸", "🛡️", "🧠", "🦉", "🎭"];
pub const DEFAULT_STAT_LABELS: [&str; 6] =
    ["Strength", "Dexterity", "Constitution", "Intelligence", "Wisdom", "Charisma"];

pub fn draw_left_panel(ctx: &egui::Context, ui_state: &UiState) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let stats = ui_state.scene.as_ref().and_then(|s| s.stats.as_ref());
                draw_character(ui, &ui_state.player, stats);
            });
        });
}

/* =========================
   Character UI
   ========================= */

fn draw_character(ui: &mut egui::Ui, player: &Player, stats: Option<&StatsPanel>) {
    ui.heading(&player.name);
    ui.separator();

    ui.horizontal(|ui| {
        ui.label(format!("💖 HP {}", unknown_or(player.hp)));
        ui.add_space(8.0);
        ui.label(format!("🔵 MP {}", unknown_or(player.mp)));
    });
    ui.label(format!("💰 Gold {}", player.gold));

    if stats.map_or(true, |s| s.visible) {
        ui.separator();
        egui::Grid::new("stats_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (i, stat) in Stat::ALL.into_iter().enumerate() {
                    let (icon, label) = stat_caption(stats, i);
                    let base = player.score(stat);
                    let modifier = player.modifier(stat);

                    ui.label(format!("{icon} {label}"));
                    ui.label(format!(
                        "({base}{modifier:+}) {}",
                        player.total_stat(stat)
                    ));
                    ui.end_row();
                }
            });
    }

    list(ui, "Abilities", &player.abilities);
    list(ui, "Inventory", &player.inventory);
}

/// Scene-provided captions, falling back to the defaults per slot.
fn stat_caption(stats: Option<&StatsPanel>, i: usize) -> (&str, &str) {
    let icon = stats
        .and_then(|s| s.icons.get(i))
        .map(String::as_str)
        .unwrap_or(DEFAULT_STAT_ICONS[i]);
    let label = stats
        .and_then(|s| s.labels.get(i))
        .map(String::as_str)
        .unwrap_or(DEFAULT_STAT_LABELS[i]);
    (icon, label)
}

fn unknown_or(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

fn list(ui: &mut egui::Ui, label: &str, items: &[Value]) {
    ui.collapsing(label, |ui| {
        if items.is_empty() {
            ui.label("None");
        } else {
            for item in items {
                let text = entry_name(item)
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string());
                ui.label(format!("• {text}"));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captions_fall_back_per_slot() {
        let partial = StatsPanel {
            visible: true,
            icons: vec!["A".into()],
            labels: vec![],
        };

        assert_eq!(stat_caption(Some(&partial), 0), ("A", "Strength"));
        assert_eq!(stat_caption(Some(&partial), 5), ("🎭", "Charisma"));
        assert_eq!(stat_caption(None, 1), ("🤸", "Dexterity"));
    }
}
