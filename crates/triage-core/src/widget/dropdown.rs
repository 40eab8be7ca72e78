use crate::bridge::{DirectSend, TurnOutcome};
use crate::error::{Result, TriageError};
use crate::prompt::{
    DropdownOption, PromptFamily, PromptKind, classify_message, extract_dropdown_options,
};
use crate::session::{Message, MessageId};

/// Single-choice menu. Choosing an option sends its label immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownWidget {
    message_id: MessageId,
    title: Option<String>,
    family: Option<PromptFamily>,
    options: Vec<DropdownOption>,
}

impl DropdownWidget {
    pub fn new(message_id: MessageId, title: Option<String>, options: Vec<DropdownOption>) -> Self {
        Self {
            message_id,
            title,
            family: None,
            options,
        }
    }

    /// Builds the widget for a bot message, or `None` when the message is not
    /// a dropdown prompt or has no option lines.
    pub fn from_message(message: &Message) -> Option<Self> {
        let prompt = classify_message(message);
        if prompt.kind != PromptKind::DropdownSelection {
            return None;
        }
        let options = extract_dropdown_options(message.text());
        if options.is_empty() {
            return None;
        }
        Some(Self {
            message_id: message.id(),
            title: prompt.title,
            family: prompt.family,
            options,
        })
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn family(&self) -> Option<PromptFamily> {
        self.family
    }

    pub fn options(&self) -> &[DropdownOption] {
        &self.options
    }

    /// Looks up an option by its zero-based position.
    pub fn option(&self, index: usize) -> Result<&DropdownOption> {
        self.options
            .get(index)
            .ok_or_else(|| TriageError::not_found("dropdown option", index.to_string()))
    }

    /// Sends the label of the option at `index`.
    pub async fn choose<S>(&self, index: usize, bridge: &S) -> Result<TurnOutcome>
    where
        S: DirectSend + ?Sized,
    {
        let label = self.option(index)?.label.clone();
        bridge.send_text(&label).await
    }

    /// Sends `label` if it is one of the options.
    pub async fn choose_label<S>(&self, label: &str, bridge: &S) -> Result<TurnOutcome>
    where
        S: DirectSend + ?Sized,
    {
        let index = self
            .options
            .iter()
            .position(|option| option.label == label)
            .ok_or_else(|| TriageError::not_found("dropdown option", label))?;
        self.choose(index, bridge).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MessageHint;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBridge {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DirectSend for RecordingBridge {
        async fn send_text(&self, text: &str) -> Result<TurnOutcome> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(TurnOutcome::Answered {
                user: MessageId::new(1),
                reply: MessageId::new(2),
            })
        }
    }

    fn harassment_menu() -> Message {
        Message::bot(
            MessageId::new(3),
            "📋 Select Harassment Type:\n☐ Rude behavior\n☐ Unsafe driving",
            MessageHint::Plain,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_click_sends_exact_label() {
        let widget = DropdownWidget::from_message(&harassment_menu()).unwrap();
        let bridge = RecordingBridge::default();

        widget.choose(1, &bridge).await.unwrap();
        assert_eq!(*bridge.sent.lock().unwrap(), vec!["Unsafe driving".to_string()]);
    }

    #[tokio::test]
    async fn test_choose_by_label() {
        let widget = DropdownWidget::from_message(&harassment_menu()).unwrap();
        let bridge = RecordingBridge::default();

        widget.choose_label("Rude behavior", &bridge).await.unwrap();
        assert!(widget.choose_label("Other", &bridge).await.unwrap_err().is_not_found());
        assert_eq!(bridge.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_sends_nothing() {
        let widget = DropdownWidget::from_message(&harassment_menu()).unwrap();
        let bridge = RecordingBridge::default();
        assert!(widget.choose(5, &bridge).await.is_err());
        assert!(bridge.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_metadata() {
        let widget = DropdownWidget::from_message(&harassment_menu()).unwrap();
        assert_eq!(widget.title(), Some("Driver Harassment Report"));
        assert_eq!(widget.family(), Some(PromptFamily::DriverHarassment));
        assert_eq!(widget.message_id(), MessageId::new(3));
    }

    #[test]
    fn test_plain_message_has_no_widget() {
        let message = Message::bot(MessageId::new(4), "All sorted!", MessageHint::Plain, Utc::now());
        assert!(DropdownWidget::from_message(&message).is_none());
    }
}
