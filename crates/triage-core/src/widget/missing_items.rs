use crate::bridge::{DirectSend, TurnOutcome};
use crate::error::{Result, TriageError};
use crate::prompt::{
    MissingItemOption, OrderContext, PromptKind, classify_message, extract_missing_items,
    extract_order_context,
};
use crate::session::{Message, MessageId};
use std::collections::BTreeSet;

/// Text sent when the user confirms nothing is missing.
pub const ALL_ITEMS_PRESENT: &str = "All items are present";

/// Checklist for a missing-items prompt.
///
/// Selection is keyed by the printed sequence number, which is only
/// meaningful within the message the widget was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingItemsWidget {
    message_id: MessageId,
    options: Vec<MissingItemOption>,
    order: Option<OrderContext>,
    selected: BTreeSet<u32>,
}

impl MissingItemsWidget {
    pub fn new(
        message_id: MessageId,
        options: Vec<MissingItemOption>,
        order: Option<OrderContext>,
    ) -> Self {
        Self {
            message_id,
            options,
            order,
            selected: BTreeSet::new(),
        }
    }

    /// Builds the widget for a bot message, or `None` when the message is not
    /// a missing-items prompt or has no option lines.
    pub fn from_message(message: &Message) -> Option<Self> {
        if classify_message(message).kind != PromptKind::MissingItemsSelection {
            return None;
        }
        let options = extract_missing_items(message.text());
        if options.is_empty() {
            return None;
        }
        Some(Self::new(
            message.id(),
            options,
            extract_order_context(message.text()),
        ))
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn options(&self) -> &[MissingItemOption] {
        &self.options
    }

    pub fn order(&self) -> Option<&OrderContext> {
        self.order.as_ref()
    }

    pub fn is_selected(&self, sequence_number: u32) -> bool {
        self.selected.contains(&sequence_number)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Flips the selection of one item and returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::NotFound` for a number not printed in the prompt.
    pub fn toggle(&mut self, sequence_number: u32) -> Result<bool> {
        if !self
            .options
            .iter()
            .any(|option| option.sequence_number == sequence_number)
        {
            return Err(TriageError::not_found(
                "missing item",
                sequence_number.to_string(),
            ));
        }

        if self.selected.remove(&sequence_number) {
            Ok(false)
        } else {
            self.selected.insert(sequence_number);
            Ok(true)
        }
    }

    /// Text describing the current selection.
    ///
    /// Items appear in prompt order, so the result does not depend on the
    /// order in which they were toggled.
    pub fn synthesize(&self) -> String {
        let chosen: Vec<&MissingItemOption> = self
            .options
            .iter()
            .filter(|option| self.selected.contains(&option.sequence_number))
            .collect();

        match chosen.as_slice() {
            [] => ALL_ITEMS_PRESENT.to_string(),
            [only] => format!("Item {} is missing: {}", only.sequence_number, only.label),
            many => {
                let numbers: Vec<String> = many
                    .iter()
                    .map(|option| option.sequence_number.to_string())
                    .collect();
                let labels: Vec<&str> = many.iter().map(|option| option.label.as_str()).collect();
                format!(
                    "Items {} are missing: {}",
                    numbers.join(", "),
                    labels.join(", ")
                )
            }
        }
    }

    /// Sends the synthesized text and clears the selection, whatever the
    /// outcome of the send.
    pub async fn submit<S>(&mut self, bridge: &S) -> Result<TurnOutcome>
    where
        S: DirectSend + ?Sized,
    {
        let text = self.synthesize();
        tracing::debug!(
            target: "widget",
            message_id = %self.message_id,
            selected = self.selected.len(),
            "Submitting missing-items selection"
        );
        let outcome = bridge.send_text(&text).await;
        self.selected.clear();
        outcome
    }
}
