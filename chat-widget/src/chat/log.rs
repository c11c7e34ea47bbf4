//! Message log model behind the rendered chat.
//!
//! The view renders [`Bubble`]s as text nodes, so nothing stored here is ever
//! parsed as markup. The only structural decoration is the streaming cursor,
//! which the view adds for bubbles flagged `streaming`.

use chrono::{DateTime, Local};

/// Fixed id of the typing placeholder element.
pub const TYPING_INDICATOR_ID: &str = "typing-indicator";

/// Cursor shown at the end of a bubble while its reply is still streaming.
pub const STREAM_CURSOR: &str = "▋";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::User => "user-message",
            Self::Bot => "bot-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub time: String,
    pub streaming: bool,
}

/// Refers to the bubble of the reply that is currently streaming.
///
/// Not `Clone`: whoever holds it is the only writer of that bubble.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamHandle {
    bubble_id: String,
}

impl StreamHandle {
    pub fn bubble_id(&self) -> &str {
        &self.bubble_id
    }
}

#[derive(Debug, Default)]
pub struct ChatLog {
    bubbles: Vec<Bubble>,
    typing: bool,
    revision: u64,
}

impl ChatLog {
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn get(&self, id: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Bumped on every mutation; the view scrolls to the bottom when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>, at: DateTime<Local>) -> &Bubble {
        self.insert(sender, text.into(), at, false)
    }

    pub fn begin_stream(&mut self, sender: Sender, at: DateTime<Local>) -> StreamHandle {
        let bubble_id = self.insert(sender, String::new(), at, true).id.clone();
        StreamHandle { bubble_id }
    }

    /// Returns `false` if the bubble is gone (e.g. the log was cleared).
    pub fn append(&mut self, handle: &StreamHandle, text: &str) -> bool {
        let Some(bubble) = self
            .bubbles
            .iter_mut()
            .rev()
            .find(|b| b.id == handle.bubble_id)
        else {
            return false;
        };
        bubble.text.push_str(text);
        self.touch();
        true
    }

    pub fn finish(&mut self, handle: StreamHandle) {
        let Some(bubble) = self
            .bubbles
            .iter_mut()
            .rev()
            .find(|b| b.id == handle.bubble_id)
        else {
            return;
        };
        bubble.streaming = false;
        self.touch();
    }

    /// Returns `true` only when the placeholder was not already shown.
    pub fn show_typing(&mut self) -> bool {
        if self.typing {
            return false;
        }
        self.typing = true;
        self.touch();
        true
    }

    pub fn hide_typing(&mut self) -> bool {
        if !self.typing {
            return false;
        }
        self.typing = false;
        self.touch();
        true
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.typing = false;
        self.touch();
    }

    fn insert(&mut self, sender: Sender, text: String, at: DateTime<Local>, streaming: bool) -> &Bubble {
        self.bubbles.push(Bubble {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            sender,
            text,
            time: format_time(at),
            streaming,
        });
        self.touch();
        &self.bubbles[self.bubbles.len() - 1]
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

pub fn format_time(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 1, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn push_records_sender_text_and_time() {
        let mut log = ChatLog::default();
        let bubble = log.push(Sender::User, "Hello", at(9, 5)).clone();

        assert_eq!(bubble.sender, Sender::User);
        assert_eq!(bubble.text, "Hello");
        assert_eq!(bubble.time, "09:05");
        assert!(!bubble.streaming);
        assert!(bubble.id.starts_with("msg_"));
        assert_eq!(log.bubbles().len(), 1);
    }

    #[test]
    fn markup_is_kept_as_plain_text() {
        let mut log = ChatLog::default();
        log.push(Sender::Bot, "<b>hi</b> & bye", at(10, 0));
        assert_eq!(log.bubbles()[0].text, "<b>hi</b> & bye");
    }

    #[test]
    fn stream_appends_in_order_then_finishes() {
        let mut log = ChatLog::default();
        let handle = log.begin_stream(Sender::Bot, at(12, 30));
        assert!(log.get(handle.bubble_id()).unwrap().streaming);

        for part in ["Hi", " there", "<i>!</i>"] {
            assert!(log.append(&handle, part));
        }
        let id = handle.bubble_id().to_string();
        log.finish(handle);

        let bubble = log.get(&id).unwrap();
        assert_eq!(bubble.text, "Hi there<i>!</i>");
        assert!(!bubble.streaming);
    }

    #[test]
    fn append_after_clear_reports_missing_bubble() {
        let mut log = ChatLog::default();
        let handle = log.begin_stream(Sender::Bot, at(8, 0));
        log.clear();

        assert!(!log.append(&handle, "late"));
        assert!(log.bubbles().is_empty());
    }

    #[test]
    fn typing_placeholder_is_a_singleton() {
        let mut log = ChatLog::default();
        assert!(!log.hide_typing());

        assert!(log.show_typing());
        assert!(!log.show_typing());
        assert!(!log.show_typing());
        assert!(log.is_typing());

        assert!(log.hide_typing());
        assert!(!log.hide_typing());
        assert!(!log.is_typing());
    }

    #[test]
    fn clear_drops_bubbles_and_typing() {
        let mut log = ChatLog::default();
        log.push(Sender::User, "a", at(1, 0));
        log.push(Sender::Bot, "b", at(1, 1));
        log.show_typing();

        log.clear();
        assert!(log.bubbles().is_empty());
        assert!(!log.is_typing());
        assert!(log.show_typing());
    }

    #[test]
    fn every_mutation_moves_the_revision() {
        let mut log = ChatLog::default();
        let start = log.revision();
        let handle = log.begin_stream(Sender::Bot, at(2, 0));
        let after_begin = log.revision();
        log.append(&handle, "x");

        assert!(after_begin > start);
        assert!(log.revision() > after_begin);
    }
}
