//! Render-ready model of the message pane.
//!
//! The frontend draws whatever is in [`ConversationView`]; it never decides
//! what belongs there.

use uuid::Uuid;

use parlor_shared::{file_url, AttachmentKind, MessageBody, MessageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    /// Welcome screen, nothing open.
    Idle,
    /// A conversation is open.
    Open { title: String, subtitle: Option<String> },
}

/// A message as displayed, with the own-message flag resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub record: MessageRecord,
    pub own: bool,
}

impl DisplayMessage {
    pub fn attachment(&self) -> Option<(AttachmentKind, &str, &str)> {
        match &self.record.body {
            MessageBody::File { path, label } => {
                Some((AttachmentKind::for_path(path), path.as_str(), label.as_str()))
            }
            MessageBody::Text(_) => None,
        }
    }

    /// Where the attachment is served from, if this message carries one.
    pub fn attachment_url(&self, server_url: &str) -> Option<String> {
        self.attachment()
            .map(|(_, path, _)| file_url(server_url, path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEntry {
    Message(DisplayMessage),
    /// Transient "uploading" line, keyed by the pending upload's temporary id.
    Uploading { temp_id: Uuid, file_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    mode: ViewMode,
    entries: Vec<ViewEntry>,
}

impl Default for ConversationView {
    fn default() -> Self {
        Self {
            mode: ViewMode::Idle,
            entries: Vec::new(),
        }
    }
}

impl ConversationView {
    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == ViewMode::Idle
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &DisplayMessage> {
        self.entries.iter().filter_map(|e| match e {
            ViewEntry::Message(m) => Some(m),
            ViewEntry::Uploading { .. } => None,
        })
    }

    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ViewEntry::Uploading { .. }))
            .count()
    }

    /// Clear the pane and show a freshly opened conversation.
    pub fn open(&mut self, title: impl Into<String>, subtitle: Option<String>) {
        self.entries.clear();
        self.mode = ViewMode::Open {
            title: title.into(),
            subtitle,
        };
    }

    /// Back to the welcome screen.
    pub fn reset_idle(&mut self) {
        self.entries.clear();
        self.mode = ViewMode::Idle;
    }

    pub fn push_message(&mut self, record: MessageRecord, own_username: &str) {
        let own = record.author == own_username;
        self.entries
            .push(ViewEntry::Message(DisplayMessage { record, own }));
    }

    /// Replace the whole pane content (history load).
    pub fn replace_messages(&mut self, records: Vec<MessageRecord>, own_username: &str) {
        self.entries.clear();
        for record in records {
            self.push_message(record, own_username);
        }
    }

    pub fn add_placeholder(&mut self, temp_id: Uuid, file_name: impl Into<String>) {
        self.entries.push(ViewEntry::Uploading {
            temp_id,
            file_name: file_name.into(),
        });
    }

    /// Remove a placeholder. Returns `false` if it was already gone
    /// (the pane was cleared by a conversation switch in the meantime).
    pub fn remove_placeholder(&mut self, temp_id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| {
            !matches!(e, ViewEntry::Uploading { temp_id: id, .. } if *id == temp_id)
        });
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(author: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: None,
            author: author.into(),
            timestamp: "12:00:00".into(),
            body: MessageBody::Text(content.into()),
        }
    }

    #[test]
    fn test_own_flag_and_order() {
        let mut view = ConversationView::default();
        view.open("General", None);
        view.push_message(text("alice", "one"), "alice");
        view.push_message(text("bob", "two"), "alice");

        let msgs: Vec<_> = view.messages().collect();
        assert!(msgs[0].own);
        assert!(!msgs[1].own);
        assert_eq!(msgs[1].record.body, MessageBody::Text("two".into()));
    }

    #[test]
    fn test_placeholder_lifecycle() {
        let mut view = ConversationView::default();
        view.open("General", None);
        let id = Uuid::new_v4();
        view.add_placeholder(id, "cat.png");
        view.push_message(text("bob", "hi"), "alice");
        assert_eq!(view.placeholder_count(), 1);

        assert!(view.remove_placeholder(id));
        assert!(!view.remove_placeholder(id));
        assert_eq!(view.entries().len(), 1);
    }

    #[test]
    fn test_reset_idle_clears_entries() {
        let mut view = ConversationView::default();
        view.open("bob", Some("Direct Message".into()));
        view.push_message(text("bob", "hi"), "alice");
        view.reset_idle();
        assert!(view.is_idle());
        assert_eq!(view.message_count(), 0);
    }

    #[test]
    fn test_attachment_classification() {
        let msg = DisplayMessage {
            record: MessageRecord {
                id: Some("m".into()),
                author: "bob".into(),
                timestamp: "t".into(),
                body: MessageBody::File {
                    path: "x_12.png".into(),
                    label: "x.png".into(),
                },
            },
            own: false,
        };
        assert_eq!(
            msg.attachment(),
            Some((AttachmentKind::Image, "x_12.png", "x.png"))
        );
        assert_eq!(
            msg.attachment_url("http://chat.local/").as_deref(),
            Some("http://chat.local/uploads/x_12.png")
        );
    }
}
