use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::components::chat_area::{self, ChatAction};
use super::components::sidebar::{self, DirectoryAction};
use super::components::{header, input_bar};
use super::state::{AppState, ComposerPhase};

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
        room: Option<i64>,
        task: Option<String>,
    ) -> Self {
        let app = Self {
            state: AppState::new(),
            command_sender,
            event_receiver,
        };
        app.send_command(NetworkCommand::Bootstrap { room, task });
        app
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            if let Some(follow_up) = self.state.apply(event) {
                self.send_command(follow_up);
            }
        }
    }

    fn send_command(&self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("failed to send command to network: {err}");
        }
    }

    /// Composer submit: idle → submitting. The input was already cleared by
    /// the input bar and stays cleared whatever the outcome.
    fn submit_input(&mut self, text: String) {
        let Some(scope) = self.state.scope.clone() else {
            return;
        };
        self.state.composer = ComposerPhase::Submitting;
        self.state.last_error = None;
        self.send_command(NetworkCommand::SendMessage { scope, text });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        if self.state.auth_required {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Sign in required");
                ui.label("Your BlueOn session could not be resolved. Sign in and relaunch.");
            });
            ctx.request_repaint();
            return;
        }

        egui::SidePanel::left("room_directory").show(ctx, |ui| {
            let action = sidebar::render(
                ui,
                &self.state.rooms,
                &self.state.tasks,
                self.state.scope.as_ref(),
            );
            match action {
                Some(DirectoryAction::OpenRoom(room_id)) => {
                    self.send_command(NetworkCommand::OpenRoom(room_id));
                }
                Some(DirectoryAction::OpenTask(task_key)) => {
                    self.send_command(NetworkCommand::OpenTask(task_key));
                }
                None => {}
            }
        });

        egui::TopBottomPanel::top("room_header").show(ctx, |ui| {
            header::render(ui, &self.state);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = self.state.last_error.clone() {
                ui.colored_label(egui::Color32::RED, error);
            }
            if let Some(notice) = self.state.empty_notice.clone() {
                ui.weak(notice);
            }

            if let Some(identity) = self.state.identity.clone() {
                let action = chat_area::render(ui, &self.state.messages, &identity);
                match action {
                    Some(ChatAction::Delete(message_id)) => {
                        self.send_command(NetworkCommand::DeleteMessage(message_id));
                    }
                    Some(ChatAction::ViewImage(url)) => {
                        self.state.viewing_image = Some(url);
                    }
                    None => {}
                }
            }

            ui.separator();
            let enabled =
                self.state.scope.is_some() && self.state.composer == ComposerPhase::Idle;
            if let Some(text) = input_bar::render(ui, &mut self.state.input_text, enabled) {
                self.submit_input(text);
            }
        });

        if let Some(url) = self.state.viewing_image.clone() {
            let mut open = true;
            egui::Window::new("Image").open(&mut open).show(ctx, |ui| {
                ui.hyperlink_to("Open full size", &url);
                ui.monospace(&url);
            });
            if !open {
                self.state.viewing_image = None;
            }
        }

        ctx.request_repaint();
    }
}
