use eframe::egui;

use crate::common::types::{ChatMessage, Identity, MessageKind};

/// What the user did inside the message list this frame.
#[derive(Debug, Clone)]
pub enum ChatAction {
    Delete(i64),
    ViewImage(String),
}

/// Render-ready projection of one canonical message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub own: bool,
    pub text: String,
    pub time: Option<String>,
    pub image_url: Option<String>,
    pub can_delete: bool,
}

/// Pure function of (canonical message, session identity). Ownership is
/// numeric id equality; the delete affordance exists only for self-authored
/// messages that carry a server-assigned id.
pub fn view_model(message: &ChatMessage, identity: &Identity) -> MessageView {
    let own = message.is_self(identity);
    MessageView {
        own,
        text: sanitize(&message.content),
        time: message.display_time(),
        image_url: match message.kind {
            MessageKind::Image => message.file_url.clone(),
            MessageKind::Text => None,
        },
        can_delete: own && message.id != 0,
    }
}

/// Message content is untrusted. Labels render text literally — markup is
/// never interpreted — and stripping control characters here keeps pasted
/// escape sequences out of the layout and the logs. Newlines survive.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_control() || *ch == '\n')
        .collect()
}

pub fn render(
    ui: &mut egui::Ui,
    messages: &[ChatMessage],
    identity: &Identity,
) -> Option<ChatAction> {
    let mut action = None;

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            for message in messages {
                let view = view_model(message, identity);
                let layout = if view.own {
                    egui::Layout::top_down(egui::Align::Max)
                } else {
                    egui::Layout::top_down(egui::Align::Min)
                };
                ui.with_layout(layout, |ui| {
                    if let Some(url) = &view.image_url {
                        if ui.link("[image]").clicked() {
                            action = Some(ChatAction::ViewImage(url.clone()));
                        }
                    } else {
                        let response = ui.label(&view.text);
                        if view.can_delete {
                            response.context_menu(|ui| {
                                if ui.button("Delete message").clicked() {
                                    action = Some(ChatAction::Delete(message.id));
                                    ui.close();
                                }
                            });
                        }
                    }
                    if let Some(time) = &view.time {
                        ui.weak(time);
                    }
                });
            }
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: i64) -> Identity {
        Identity {
            id,
            nickname: "me".into(),
            avatar: None,
        }
    }

    fn text_message(id: i64, sender_id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            room_id: 5,
            sender_id,
            kind: MessageKind::Text,
            content: content.into(),
            file_url: None,
            created_at: Some("2024-01-01T00:00:00Z".into()),
        }
    }

    #[test]
    fn own_message_classifies_as_self() {
        let view = view_model(&text_message(1, 1, "hi"), &identity(1));
        assert!(view.own);
        assert!(view.can_delete);
        assert_eq!(view.text, "hi");
    }

    #[test]
    fn counterpart_message_gets_no_delete_affordance() {
        let view = view_model(&text_message(1, 2, "hi"), &identity(1));
        assert!(!view.own);
        assert!(!view.can_delete);
    }

    #[test]
    fn local_echo_without_server_id_gets_no_delete_affordance() {
        let view = view_model(&text_message(0, 1, "hi"), &identity(1));
        assert!(view.own);
        assert!(!view.can_delete);
    }

    #[test]
    fn markup_stays_inert_literal_text() {
        let view = view_model(
            &text_message(1, 2, "<script>alert(1)</script>"),
            &identity(1),
        );
        // Labels draw text as-is; the markup must survive verbatim as plain
        // text, never as anything interpretable.
        assert_eq!(view.text, "<script>alert(1)</script>");
    }

    #[test]
    fn control_characters_are_stripped_but_newlines_kept() {
        assert_eq!(sanitize("a\x1b[31mb\nc\r"), "ab\nc");
    }

    #[test]
    fn image_messages_expose_the_file_reference() {
        let mut message = text_message(1, 2, "");
        message.kind = MessageKind::Image;
        message.file_url = Some("/up/x.png".into());
        let view = view_model(&message, &identity(1));
        assert_eq!(view.image_url.as_deref(), Some("/up/x.png"));
    }
}
