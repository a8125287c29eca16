use eframe::egui;

use crate::ui::state::AppState;

/// Active-conversation header: counterpart identity, task context when the
/// scope is task-bound, unread badge, and the channel status line.
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.horizontal(|ui| {
        match state.counterpart_display() {
            Some((nickname, avatar)) => {
                ui.strong(nickname);
                if let Some(avatar) = avatar {
                    ui.weak(avatar);
                }
            }
            None => {
                ui.weak("No conversation selected");
            }
        }

        if let Some(context) = &state.task_context {
            ui.separator();
            ui.label(&context.service_title);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if state.unread_total > 0 {
                ui.colored_label(
                    egui::Color32::LIGHT_RED,
                    format!("{} unread", state.unread_total),
                );
            }
            if let Some(note) = &state.channel_note {
                ui.weak(format!("live updates off: {note}"));
            }
        });
    });
}
