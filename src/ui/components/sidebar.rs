use eframe::egui;

use crate::common::types::{ChatScope, ExpertTask, Room};

#[derive(Debug, Clone)]
pub enum DirectoryAction {
    OpenRoom(i64),
    OpenTask(String),
}

/// Room directory plus the expert's task list. Every label comes verbatim
/// from the server records; selecting an entry carries only its id/key.
pub fn render(
    ui: &mut egui::Ui,
    rooms: &[Room],
    tasks: &[ExpertTask],
    active: Option<&ChatScope>,
) -> Option<DirectoryAction> {
    let mut action = None;

    ui.heading("Conversations");
    ui.separator();

    if rooms.is_empty() {
        ui.label("No conversations yet");
    }
    for room in rooms {
        let selected = matches!(active, Some(ChatScope::Room(id)) if *id == room.room_id);
        if ui.selectable_label(selected, &room.other_nickname).clicked() {
            action = Some(DirectoryAction::OpenRoom(room.room_id));
        }
    }

    if !tasks.is_empty() {
        ui.separator();
        ui.heading("Tasks");
        for task in tasks {
            let selected = matches!(
                active,
                Some(ChatScope::Task { task_key, .. }) if *task_key == task.task_key
            );
            let label = if task.status.is_empty() {
                task.service_title.clone()
            } else {
                format!("{} · {}", task.service_title, task.status)
            };
            if ui.selectable_label(selected, label).clicked() {
                action = Some(DirectoryAction::OpenTask(task.task_key.clone()));
            }
        }
    }

    action
}
