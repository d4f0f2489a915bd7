use crate::message::Attachment;

use super::sanitize::escape_angle_brackets;
use super::transport::ChatTransport;

/// Shown in place of a reply when the request fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn css_class(&self) -> &'static str {
        match self {
            Sender::User => "user-message",
            Sender::Bot => "bot-message",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self { key: Key::Enter, shift: false }
    }

    pub fn shift_enter() -> Self {
        Self { key: Key::Enter, shift: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send: empty input and no attachment.
    Skipped,
    Replied,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Sent(SendOutcome),
    /// Let the input insert a line break.
    InsertNewline,
    Ignored,
}

/// The surface the controller draws on.
pub trait ChatView {
    fn input_text(&self) -> String;
    fn clear_input(&mut self);
    /// Resize the input to fit its content.
    fn auto_grow_input(&mut self);
    /// Append a message to the log. The content is escaped markup when
    /// [`ChatView::renders_markup`] is true, plain text otherwise.
    fn append_message(&mut self, sender: Sender, content: &str);
    fn scroll_to_bottom(&mut self);

    /// Whether appended content is interpreted as markup.
    fn renders_markup(&self) -> bool {
        true
    }
}

pub struct ChatController<V, T> {
    view: V,
    transport: T,
    pending_attachment: Option<Attachment>,
}

impl<V: ChatView, T: ChatTransport> ChatController<V, T> {
    pub fn new(view: V, transport: T) -> Self {
        Self { view, transport, pending_attachment: None }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.pending_attachment.as_ref()
    }

    /// Stage a file for the next send. Replaces any file already staged.
    pub fn attach(&mut self, file: Attachment) {
        let note = attachment_note(&file);
        self.pending_attachment = Some(file);
        self.render(Sender::User, &note);
    }

    pub fn on_input(&mut self) {
        self.view.auto_grow_input();
    }

    pub async fn on_key(&mut self, press: KeyPress) -> KeyOutcome {
        match press {
            KeyPress { key: Key::Enter, shift: false } => KeyOutcome::Sent(self.send().await),
            KeyPress { key: Key::Enter, shift: true } => KeyOutcome::InsertNewline,
            KeyPress { key: Key::Other, .. } => KeyOutcome::Ignored,
        }
    }

    pub async fn send(&mut self) -> SendOutcome {
        let text = self.view.input_text().trim().to_string();
        if text.is_empty() && self.pending_attachment.is_none() {
            return SendOutcome::Skipped;
        }

        let echo = match &self.pending_attachment {
            Some(file) if text.is_empty() => attachment_note(file),
            _ => text.clone(),
        };
        self.render(Sender::User, &echo);
        self.view.clear_input();
        self.view.auto_grow_input();

        let result = self
            .transport
            .submit(&text, self.pending_attachment.as_ref())
            .await;
        self.pending_attachment = None;

        match result {
            Ok(reply) => {
                self.render(Sender::Bot, &reply);
                SendOutcome::Replied
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                self.render(Sender::Bot, FALLBACK_REPLY);
                SendOutcome::Failed
            }
        }
    }

    fn render(&mut self, sender: Sender, text: &str) {
        if self.view.renders_markup() {
            let markup = escape_angle_brackets(text);
            self.view.append_message(sender, &markup);
        } else {
            self.view.append_message(sender, text);
        }
        self.view.scroll_to_bottom();
    }
}

fn attachment_note(file: &Attachment) -> String {
    format!("Attached file: {}", file.file_name)
}
