//! Conversation controller implementation.
//!
//! `ConversationController` drives one chat screen activation through
//! `Bootstrapping → AwaitingCategory → AwaitingSubIssue → AwaitingChatInput`
//! and is the only component that appends to the message history.
//!
//! # Thread Safety
//!
//! All methods take `&self`. The session and history sit behind a `RwLock`
//! that is never held across an upstream call; the `sending` flag keeps a
//! second call from starting while one is in flight.

use super::outcome::StepOutcome;
use super::sending_guard::SendingGuard;
use crate::templates::{MessageTemplates, TemplateContext};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use triage_core::bridge::{DirectSend, TurnOutcome};
use triage_core::catalog::{CatalogClient, Category, SubIssue};
use triage_core::config::ClientConfig;
use triage_core::gateway::{
    ChatTurnRequest, HistoryEntry, ImageData, ImageTurnRequest, MissingItemsRequest,
    SupportGateway,
};
use triage_core::session::{
    ConversationSession, ConversationState, LaunchContext, Message, MessageHint, MessageId,
    MessageIdSequence, Sender, TerminationReason,
};
use triage_core::{Result, TriageError};
use uuid::Uuid;

/// Prefix of the user message echoing a category or sub-issue choice.
///
/// The full echo is `I selected: <name>`; the prompt classifier never treats
/// user messages as structured prompts, so menu names cannot misfire here.
pub const ECHO_PREFIX: &str = "I selected: ";

/// Mutable conversation data guarded by the controller's lock.
struct Conversation {
    session: Option<ConversationSession>,
    state: ConversationState,
    history: Vec<Message>,
    ids: MessageIdSequence,
    categories: Vec<Category>,
    sub_issues: Vec<SubIssue>,
}

impl Conversation {
    fn active_session(&self) -> Result<&ConversationSession> {
        if self.state.is_terminated() {
            return Err(TriageError::Terminated);
        }
        self.session.as_ref().ok_or(TriageError::Terminated)
    }

    fn active_session_mut(&mut self) -> Result<&mut ConversationSession> {
        if self.state.is_terminated() {
            return Err(TriageError::Terminated);
        }
        self.session.as_mut().ok_or(TriageError::Terminated)
    }

    fn require_state(&self, expected: ConversationState) -> Result<&ConversationSession> {
        let session = self.active_session()?;
        if self.state != expected {
            return Err(TriageError::invalid_state(expected.name(), self.state));
        }
        Ok(session)
    }

    fn append_user(&mut self, text: impl Into<String>) -> MessageId {
        let now = Utc::now();
        let id = self.ids.next(Sender::User, now);
        self.history.push(Message::user(id, text, now));
        id
    }

    fn append_bot(&mut self, text: impl Into<String>, hint: MessageHint) -> MessageId {
        let now = Utc::now();
        let id = self.ids.next(Sender::Bot, now);
        self.history.push(Message::bot(id, text, hint, now));
        id
    }

    fn snapshot(&self) -> Vec<HistoryEntry> {
        self.history.iter().map(HistoryEntry::from).collect()
    }
}

/// The conversation state machine for one chat screen activation.
///
/// # Responsibilities
///
/// - Fetching the issue taxonomy and offering it as bot messages
/// - Recording category and sub-issue choices in the session
/// - Routing the reserved missing-items sub-issue to its dedicated endpoint
/// - Running chat turns for typed and synthesized text (`DirectSend`)
/// - Uploading images attached to earlier messages
///
/// Upstream failures never escape as errors: they become apology messages
/// and a `Degraded` outcome. `Err` is reserved for calls that are not
/// allowed right now (turn in flight, wrong state, unknown id, terminated).
pub struct ConversationController {
    catalog: Arc<dyn CatalogClient>,
    gateway: Arc<dyn SupportGateway>,
    templates: MessageTemplates,
    missing_items_sub_issue_id: String,
    missing_items_request: String,
    conversation: RwLock<Conversation>,
    sending: AtomicBool,
}

impl ConversationController {
    /// Creates a controller for one chat screen activation.
    ///
    /// When `launch` lacks a service or user type the controller starts in
    /// `Terminated(MissingContext)`, and `state().redirect_to_dashboard()`
    /// tells the host to leave the chat screen.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Template` if a configured template does not parse.
    pub fn new(
        launch: LaunchContext,
        config: &ClientConfig,
        catalog: Arc<dyn CatalogClient>,
        gateway: Arc<dyn SupportGateway>,
    ) -> Result<Self> {
        let templates = MessageTemplates::new(config.templates.clone())?;

        let (session, state) =
            match launch.into_session_context(&config.conversation.default_username) {
                Ok(context) => {
                    let conversation_id = Uuid::new_v4().to_string();
                    tracing::info!(
                        target: "conversation",
                        conversation_id = %conversation_id,
                        service = %context.service,
                        user_type = %context.user_type,
                        "Conversation created"
                    );
                    (
                        Some(ConversationSession::new(conversation_id, context)),
                        ConversationState::Bootstrapping,
                    )
                }
                Err(e) => {
                    tracing::warn!(target: "conversation", error = %e, "Launch context incomplete, redirecting to dashboard");
                    (
                        None,
                        ConversationState::Terminated(TerminationReason::MissingContext),
                    )
                }
            };

        Ok(Self {
            catalog,
            gateway,
            templates,
            missing_items_sub_issue_id: config.conversation.missing_items_sub_issue_id.clone(),
            missing_items_request: config.conversation.missing_items_request.clone(),
            conversation: RwLock::new(Conversation {
                session,
                state,
                history: Vec::new(),
                ids: MessageIdSequence::new(),
                categories: Vec::new(),
                sub_issues: Vec::new(),
            }),
            sending: AtomicBool::new(false),
        })
    }

    // ============================================================================
    // Guided steps
    // ============================================================================

    /// Loads the categories and greets the user.
    ///
    /// Moves to `AwaitingCategory` whether or not the catalog answered; on
    /// failure the category list stays empty and an apology is shown.
    pub async fn start(&self) -> Result<StepOutcome> {
        let _guard = SendingGuard::acquire(&self.sending)?;
        let session = {
            let conversation = self.conversation.read().await;
            conversation
                .require_state(ConversationState::Bootstrapping)?
                .clone()
        };
        let context = session.context();

        let result = self
            .catalog
            .categories(&context.service, &context.user_type)
            .await;

        let mut conversation = self.conversation.write().await;
        conversation.active_session()?;
        conversation.state = ConversationState::AwaitingCategory;
        let ctx = TemplateContext::from_session(&session);

        match result {
            Ok(categories) => {
                tracing::info!(target: "conversation", count = categories.len(), "Categories loaded");
                conversation.categories = categories.clone();
                let id = conversation.append_bot(
                    self.templates.greeting(&ctx),
                    MessageHint::OffersCategories(categories),
                );
                Ok(StepOutcome::Answered(id))
            }
            Err(error) => {
                tracing::warn!(target: "conversation", error = %error, "Category fetch failed");
                conversation.categories.clear();
                let id = conversation
                    .append_bot(self.templates.catalog_apology(&ctx), MessageHint::Plain);
                Ok(StepOutcome::Degraded { message: id, error })
            }
        }
    }

    /// Records a category choice and offers its sub-issues.
    ///
    /// If the sub-issues cannot be loaded the conversation stays in
    /// `AwaitingCategory` so another category can be picked.
    ///
    /// # Errors
    ///
    /// - `TriageError::NotFound` if `category_id` was not offered
    /// - `TriageError::InvalidState` outside `AwaitingCategory`
    pub async fn select_category(&self, category_id: &str) -> Result<StepOutcome> {
        let _guard = SendingGuard::acquire(&self.sending)?;
        let (session, category) = {
            let mut conversation = self.conversation.write().await;
            let session = conversation
                .require_state(ConversationState::AwaitingCategory)?
                .clone();
            let category = conversation
                .categories
                .iter()
                .find(|c| c.id == category_id)
                .cloned()
                .ok_or_else(|| TriageError::not_found("category", category_id))?;
            conversation.append_user(format!("{ECHO_PREFIX}{}", category.name));
            (session, category)
        };
        let context = session.context();
        tracing::debug!(target: "conversation", category_id = %category.id, "Category selected");

        let result = self
            .catalog
            .sub_issues(&context.service, &context.user_type, &category.id)
            .await;

        let mut conversation = self.conversation.write().await;
        conversation.active_session()?;

        match result {
            Ok(sub_issues) => {
                tracing::info!(target: "conversation", count = sub_issues.len(), "Sub-issues loaded");
                let session = conversation.active_session_mut()?;
                session.select_category(category);
                let text = self
                    .templates
                    .sub_issue_prompt(&TemplateContext::from_session(session));
                conversation.sub_issues = sub_issues.clone();
                conversation.state = ConversationState::AwaitingSubIssue;
                let id = conversation.append_bot(text, MessageHint::OffersSubIssues(sub_issues));
                Ok(StepOutcome::Answered(id))
            }
            Err(error) => {
                tracing::warn!(target: "conversation", error = %error, "Sub-issue fetch failed");
                let text = self
                    .templates
                    .catalog_apology(&TemplateContext::from_session(&session));
                let id = conversation.append_bot(text, MessageHint::Plain);
                Ok(StepOutcome::Degraded { message: id, error })
            }
        }
    }

    /// Records a sub-issue choice and opens free chat.
    ///
    /// The reserved missing-items sub-issue asks the dedicated endpoint for
    /// the item checklist; if that call fails the generic describe-your-issue
    /// prompt is shown instead.
    ///
    /// # Errors
    ///
    /// - `TriageError::NotFound` if `sub_issue_id` was not offered
    /// - `TriageError::InvalidState` outside `AwaitingSubIssue`
    pub async fn select_sub_issue(&self, sub_issue_id: &str) -> Result<StepOutcome> {
        let _guard = SendingGuard::acquire(&self.sending)?;
        let session = {
            let mut conversation = self.conversation.write().await;
            conversation.require_state(ConversationState::AwaitingSubIssue)?;
            let sub_issue = conversation
                .sub_issues
                .iter()
                .find(|s| s.id == sub_issue_id)
                .cloned()
                .ok_or_else(|| TriageError::not_found("sub_issue", sub_issue_id))?;
            conversation.append_user(format!("{ECHO_PREFIX}{}", sub_issue.name));
            let session = conversation.active_session_mut()?;
            session.select_sub_issue(sub_issue);
            session.clone()
        };
        tracing::debug!(target: "conversation", sub_issue_id, "Sub-issue selected");

        if sub_issue_id != self.missing_items_sub_issue_id {
            let mut conversation = self.conversation.write().await;
            conversation.active_session()?;
            conversation.state = ConversationState::AwaitingChatInput;
            let text = self
                .templates
                .describe_issue(&TemplateContext::from_session(&session));
            let id = conversation.append_bot(text, MessageHint::Plain);
            return Ok(StepOutcome::Answered(id));
        }

        let context = session.context();
        let request = MissingItemsRequest {
            message: self.missing_items_request.clone(),
            username: context.username.clone(),
            order_id: context.order_id.clone(),
        };
        let result = self.gateway.missing_items_turn(request).await;

        let mut conversation = self.conversation.write().await;
        conversation.active_session()?;
        conversation.state = ConversationState::AwaitingChatInput;

        match result {
            Ok(reply) => {
                if !reply.success {
                    tracing::warn!(target: "conversation", "Missing-items endpoint reported failure");
                }
                let id = conversation.append_bot(reply.response, MessageHint::Plain);
                Ok(StepOutcome::Answered(id))
            }
            Err(error) => {
                tracing::warn!(target: "conversation", error = %error, "Missing-items endpoint failed, using generic prompt");
                let text = self
                    .templates
                    .describe_issue(&TemplateContext::from_session(&session));
                let id = conversation.append_bot(text, MessageHint::Plain);
                Ok(StepOutcome::Degraded { message: id, error })
            }
        }
    }

    // ============================================================================
    // Chat turns
    // ============================================================================

    /// Runs one chat turn for typed or synthesized text.
    ///
    /// Appends exactly one user message and, unless the conversation was
    /// terminated while the call was in flight, exactly one bot message.
    ///
    /// # Errors
    ///
    /// - `TriageError::EmptyInput` for blank text
    /// - `TriageError::SendInProgress` while another call is in flight
    /// - `TriageError::InvalidState` outside `AwaitingChatInput`
    pub async fn send_text(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TriageError::EmptyInput("message"));
        }

        let _guard = SendingGuard::acquire(&self.sending)?;
        let (session, user, request) = {
            let mut conversation = self.conversation.write().await;
            let session = conversation
                .require_state(ConversationState::AwaitingChatInput)?
                .clone();
            let user = conversation.append_user(text);
            let request = chat_request(&session, text, conversation.snapshot());
            (session, user, request)
        };
        tracing::debug!(target: "conversation", message_id = %user, len = text.len(), "Sending chat turn");
        tracing::trace!(target: "conversation", text, "Chat turn text");

        let result = self.gateway.chat_turn(request).await;

        let mut conversation = self.conversation.write().await;
        conversation.active_session()?;

        match result {
            Ok(reply) => {
                let hint = if reply.requires_image {
                    MessageHint::RequestsImage {
                        prompt: reply.image_request,
                    }
                } else {
                    MessageHint::Plain
                };
                let reply_id = conversation.append_bot(reply.response, hint);
                tracing::debug!(target: "conversation", message_id = %reply_id, "Chat turn answered");
                Ok(TurnOutcome::Answered {
                    user,
                    reply: reply_id,
                })
            }
            Err(error) => {
                tracing::warn!(target: "conversation", error = %error, "Chat turn failed");
                let apology = conversation.append_bot(
                    self.templates
                        .chat_apology(&TemplateContext::from_session(&session)),
                    MessageHint::Plain,
                );
                Ok(TurnOutcome::Degraded {
                    user,
                    apology,
                    error,
                })
            }
        }
    }

    /// Uploads an image answering the message `message_id`.
    ///
    /// Does not change the conversation state and appends only the bot reply
    /// (or an apology asking to retry).
    ///
    /// # Errors
    ///
    /// - `TriageError::EmptyInput` for an empty payload
    /// - `TriageError::NotFound` if `message_id` is not in the history
    /// - `TriageError::SendInProgress` while another call is in flight
    pub async fn submit_image(&self, message_id: MessageId, image: ImageData) -> Result<StepOutcome> {
        if image.is_empty() {
            return Err(TriageError::EmptyInput("image"));
        }

        let _guard = SendingGuard::acquire(&self.sending)?;
        let (session, request) = {
            let conversation = self.conversation.read().await;
            let session = conversation.active_session()?.clone();
            if !conversation.history.iter().any(|m| m.id() == message_id) {
                return Err(TriageError::not_found("message", message_id.to_string()));
            }
            let request = image_request(&session, message_id, image, conversation.snapshot());
            (session, request)
        };
        tracing::debug!(target: "conversation", message_id = %message_id, "Uploading image");

        let result = self.gateway.image_turn(request).await;

        let mut conversation = self.conversation.write().await;
        conversation.active_session()?;

        match result {
            Ok(reply) => {
                let id = conversation.append_bot(reply.response, MessageHint::Plain);
                Ok(StepOutcome::Answered(id))
            }
            Err(error) => {
                tracing::warn!(target: "conversation", error = %error, "Image upload failed");
                let id = conversation.append_bot(
                    self.templates
                        .image_apology(&TemplateContext::from_session(&session)),
                    MessageHint::Plain,
                );
                Ok(StepOutcome::Degraded { message: id, error })
            }
        }
    }

    /// Ends the conversation. Later operations return `TriageError::Terminated`.
    pub async fn terminate(&self) {
        let mut conversation = self.conversation.write().await;
        if !conversation.state.is_terminated() {
            conversation.state = ConversationState::Terminated(TerminationReason::NavigatedAway);
            tracing::info!(target: "conversation", messages = conversation.history.len(), "Conversation terminated");
        }
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn state(&self) -> ConversationState {
        self.conversation.read().await.state
    }

    /// Snapshot of the history in append order.
    pub async fn history(&self) -> Vec<Message> {
        self.conversation.read().await.history.clone()
    }

    pub async fn message(&self, id: MessageId) -> Option<Message> {
        self.conversation
            .read()
            .await
            .history
            .iter()
            .find(|m| m.id() == id)
            .cloned()
    }

    /// `None` when the launch context was incomplete.
    pub async fn session(&self) -> Option<ConversationSession> {
        self.conversation.read().await.session.clone()
    }

    /// The latest bot message asking for an image, if any.
    pub async fn latest_image_request(&self) -> Option<MessageId> {
        self.conversation
            .read()
            .await
            .history
            .iter()
            .rev()
            .find(|m| m.requests_image())
            .map(Message::id)
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }
}

#[async_trait]
impl DirectSend for ConversationController {
    async fn send_text(&self, text: &str) -> Result<TurnOutcome> {
        ConversationController::send_text(self, text).await
    }
}

fn chat_request(
    session: &ConversationSession,
    text: &str,
    messages: Vec<HistoryEntry>,
) -> ChatTurnRequest {
    let context = session.context();
    ChatTurnRequest {
        message: text.to_string(),
        service: context.service.clone(),
        user_type: context.user_type.clone(),
        username: context.username.clone(),
        conversation_id: session.conversation_id().to_string(),
        category: session.selected_category().map(|c| c.id.clone()),
        sub_issue: session.selected_sub_issue().map(|s| s.id.clone()),
        messages,
        order_id: context.order_id.clone(),
    }
}

fn image_request(
    session: &ConversationSession,
    message_id: MessageId,
    image_data: ImageData,
    messages: Vec<HistoryEntry>,
) -> ImageTurnRequest {
    let context = session.context();
    ImageTurnRequest {
        image_data,
        service: context.service.clone(),
        user_type: context.user_type.clone(),
        username: context.username.clone(),
        conversation_id: session.conversation_id().to_string(),
        message_id,
        category: session.selected_category().map(|c| c.id.clone()),
        sub_issue: session.selected_sub_issue().map(|s| s.id.clone()),
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use triage_core::gateway::{ChatTurnReply, MissingItemsReply, TurnReply};

    // ============================================================================
    // Mocks
    // ============================================================================

    struct MockCatalog {
        categories: Result<Vec<Category>>,
        sub_issues: Result<Vec<SubIssue>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockCatalog {
        fn new() -> Self {
            Self {
                categories: Ok(vec![
                    Category::new("order_issues", "Order Issues"),
                    Category::new("payment", "Payment"),
                ]),
                sub_issues: Ok(vec![
                    SubIssue::new("handle_missing_items", "Missing items"),
                    SubIssue::new("late_delivery", "Late delivery"),
                ]),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                categories: Err(TriageError::transport("connection refused", true)),
                sub_issues: Err(TriageError::transport("connection refused", true)),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for MockCatalog {
        async fn categories(&self, service: &str, user_type: &str) -> Result<Vec<Category>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("categories/{service}/{user_type}"));
            self.categories.clone()
        }

        async fn sub_issues(
            &self,
            service: &str,
            user_type: &str,
            category_id: &str,
        ) -> Result<Vec<SubIssue>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("subissues/{service}/{user_type}/{category_id}"));
            self.sub_issues.clone()
        }
    }

    #[derive(Default)]
    struct MockGateway {
        chat_replies: Mutex<VecDeque<Result<ChatTurnReply>>>,
        image_reply: Mutex<Option<Result<TurnReply>>>,
        missing_items_reply: Mutex<Option<Result<MissingItemsReply>>>,
        chat_requests: Mutex<Vec<ChatTurnRequest>>,
        image_requests: Mutex<Vec<ImageTurnRequest>>,
        missing_items_requests: Mutex<Vec<MissingItemsRequest>>,
        entered: Notify,
        release: Option<Notify>,
    }

    impl MockGateway {
        fn gated() -> Self {
            Self {
                release: Some(Notify::new()),
                ..Self::default()
            }
        }

        fn push_chat(&self, reply: Result<ChatTurnReply>) {
            self.chat_replies.lock().unwrap().push_back(reply);
        }
    }

    fn reply(text: &str) -> ChatTurnReply {
        ChatTurnReply {
            response: text.to_string(),
            requires_image: false,
            image_request: None,
        }
    }

    #[async_trait]
    impl SupportGateway for MockGateway {
        async fn chat_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnReply> {
            self.chat_requests.lock().unwrap().push(request);
            self.entered.notify_one();
            if let Some(release) = &self.release {
                release.notified().await;
            }
            self.chat_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(reply("OK")))
        }

        async fn image_turn(&self, request: ImageTurnRequest) -> Result<TurnReply> {
            self.image_requests.lock().unwrap().push(request);
            self.image_reply.lock().unwrap().take().unwrap_or_else(|| {
                Ok(TurnReply {
                    response: "Thanks for the photo.".to_string(),
                })
            })
        }

        async fn missing_items_turn(
            &self,
            request: MissingItemsRequest,
        ) -> Result<MissingItemsReply> {
            self.missing_items_requests.lock().unwrap().push(request);
            self.missing_items_reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(TriageError::upstream(500, "not configured")))
        }
    }

    fn launch() -> LaunchContext {
        LaunchContext {
            service: Some("grab_food".to_string()),
            user_type: Some("customer".to_string()),
            username: Some("mei".to_string()),
            order_id: Some("GF-1001".to_string()),
        }
    }

    fn controller(catalog: MockCatalog, gateway: Arc<MockGateway>) -> ConversationController {
        ConversationController::new(launch(), &ClientConfig::default(), Arc::new(catalog), gateway)
            .unwrap()
    }

    async fn chat_ready(gateway: Arc<MockGateway>) -> ConversationController {
        let controller = controller(MockCatalog::new(), gateway);
        controller.start().await.unwrap();
        controller.select_category("order_issues").await.unwrap();
        controller.select_sub_issue("late_delivery").await.unwrap();
        controller
    }

    // ============================================================================
    // Entry and guided steps
    // ============================================================================

    #[tokio::test]
    async fn test_missing_context_terminates() {
        let launch = LaunchContext {
            user_type: None,
            ..launch()
        };
        let controller = ConversationController::new(
            launch,
            &ClientConfig::default(),
            Arc::new(MockCatalog::new()),
            Arc::new(MockGateway::default()),
        )
        .unwrap();

        let state = controller.state().await;
        assert_eq!(
            state,
            ConversationState::Terminated(TerminationReason::MissingContext)
        );
        assert!(state.redirect_to_dashboard());
        assert!(controller.session().await.is_none());
        assert_eq!(controller.start().await, Err(TriageError::Terminated));
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_start_offers_categories() {
        let controller = controller(MockCatalog::new(), Arc::new(MockGateway::default()));
        assert_eq!(controller.state().await, ConversationState::Bootstrapping);

        let outcome = controller.start().await.unwrap();
        assert!(outcome.is_answered());
        assert_eq!(controller.state().await, ConversationState::AwaitingCategory);

        let history = controller.history().await;
        assert_eq!(history.len(), 1);
        assert!(history[0].offers_categories());
        assert!(history[0].text().contains("GrabFood"));
        assert_eq!(history[0].id(), outcome.message_id());
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid() {
        let controller = controller(MockCatalog::new(), Arc::new(MockGateway::default()));
        controller.start().await.unwrap();
        let err = controller.start().await.unwrap_err();
        assert!(matches!(err, TriageError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_category_fetch_failure_degrades() {
        let controller = controller(MockCatalog::failing(), Arc::new(MockGateway::default()));

        let outcome = controller.start().await.unwrap();
        assert!(!outcome.is_answered());
        assert_eq!(controller.state().await, ConversationState::AwaitingCategory);

        let history = controller.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hint(), &MessageHint::Plain);
        assert!(history[0].text().starts_with("Sorry"));
        assert!(!controller.is_sending());

        // Nothing was offered, so nothing can be picked
        let err = controller.select_category("order_issues").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_select_category_echoes_and_offers_sub_issues() {
        let catalog = MockCatalog::new();
        let controller = controller(catalog, Arc::new(MockGateway::default()));
        controller.start().await.unwrap();

        controller.select_category("order_issues").await.unwrap();

        assert_eq!(controller.state().await, ConversationState::AwaitingSubIssue);
        let history = controller.history().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].sender(), Sender::User);
        assert_eq!(history[1].text(), "I selected: Order Issues");
        assert!(history[2].offers_sub_issues());
        assert!(history[2].text().contains("Order Issues"));

        let session = controller.session().await.unwrap();
        assert_eq!(session.selected_category().unwrap().id, "order_issues");
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected_without_append() {
        let controller = controller(MockCatalog::new(), Arc::new(MockGateway::default()));
        controller.start().await.unwrap();

        let err = controller.select_category("lost_and_found").await.unwrap_err();
        assert_eq!(err, TriageError::not_found("category", "lost_and_found"));
        assert_eq!(controller.history().await.len(), 1);
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_generic_sub_issue_prompts_for_description() {
        let gateway = Arc::new(MockGateway::default());
        let controller = chat_ready(gateway.clone()).await;

        assert_eq!(controller.state().await, ConversationState::AwaitingChatInput);
        let history = controller.history().await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[3].text(), "I selected: Late delivery");
        assert!(history[4].text().contains("\"Late delivery\""));
        assert!(gateway.missing_items_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_items_sub_issue_uses_dedicated_endpoint() {
        let gateway = Arc::new(MockGateway::default());
        *gateway.missing_items_reply.lock().unwrap() = Some(Ok(MissingItemsReply {
            response: "🔍 **Missing Items Selection**\n\n☐ 1. Coke\n☐ 2. Fries".to_string(),
            success: true,
        }));
        let controller = controller(MockCatalog::new(), gateway.clone());
        controller.start().await.unwrap();
        controller.select_category("order_issues").await.unwrap();

        let outcome = controller
            .select_sub_issue("handle_missing_items")
            .await
            .unwrap();

        assert!(outcome.is_answered());
        let requests = gateway.missing_items_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].username, "mei");
        assert_eq!(requests[0].order_id.as_deref(), Some("GF-1001"));

        let bot = controller.message(outcome.message_id()).await.unwrap();
        assert!(bot.text().contains("☐ 1. Coke"));
        assert_eq!(controller.state().await, ConversationState::AwaitingChatInput);
    }

    #[tokio::test]
    async fn test_missing_items_failure_falls_back_to_generic_prompt() {
        let gateway = Arc::new(MockGateway::default());
        let controller = controller(MockCatalog::new(), gateway.clone());
        controller.start().await.unwrap();
        controller.select_category("order_issues").await.unwrap();

        let outcome = controller
            .select_sub_issue("handle_missing_items")
            .await
            .unwrap();

        assert!(!outcome.is_answered());
        let bot = controller.message(outcome.message_id()).await.unwrap();
        assert!(bot.text().contains("\"Missing items\""));
        assert_eq!(controller.state().await, ConversationState::AwaitingChatInput);
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_missing_items_unsuccessful_reply_is_still_shown() {
        let gateway = Arc::new(MockGateway::default());
        *gateway.missing_items_reply.lock().unwrap() = Some(Ok(MissingItemsReply {
            response: "I'm unable to find your order details.".to_string(),
            success: false,
        }));
        let controller = controller(MockCatalog::new(), gateway);
        controller.start().await.unwrap();
        controller.select_category("order_issues").await.unwrap();

        let outcome = controller
            .select_sub_issue("handle_missing_items")
            .await
            .unwrap();

        assert!(outcome.is_answered());
        let bot = controller.message(outcome.message_id()).await.unwrap();
        assert_eq!(bot.text(), "I'm unable to find your order details.");
    }

    // ============================================================================
    // Chat turns
    // ============================================================================

    #[tokio::test]
    async fn test_send_text_carries_full_context() {
        let gateway = Arc::new(MockGateway::default());
        let controller = chat_ready(gateway.clone()).await;
        let session = controller.session().await.unwrap();

        let outcome = controller.send_text("  My food is 40 minutes late  ").await.unwrap();
        assert!(outcome.is_answered());

        let requests = gateway.chat_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.message, "My food is 40 minutes late");
        assert_eq!(request.conversation_id, session.conversation_id());
        assert_eq!(request.category.as_deref(), Some("order_issues"));
        assert_eq!(request.sub_issue.as_deref(), Some("late_delivery"));
        assert_eq!(request.order_id.as_deref(), Some("GF-1001"));
        // Snapshot includes the message being sent
        assert_eq!(request.messages.len(), 6);
        assert_eq!(request.messages[5].text, "My food is 40 minutes late");
    }

    #[tokio::test]
    async fn test_history_grows_by_two_per_turn() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_chat(Ok(reply("Sorry to hear that.")));
        gateway.push_chat(Err(TriageError::transport("timed out", true)));
        let controller = chat_ready(gateway).await;

        let before = controller.history().await.len();
        controller.send_text("first").await.unwrap();
        assert_eq!(controller.history().await.len(), before + 2);

        let outcome = controller.send_text("second").await.unwrap();
        assert_eq!(controller.history().await.len(), before + 4);
        assert!(!outcome.is_answered());
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_user_message() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_chat(Err(TriageError::upstream(500, "boom")));
        let controller = chat_ready(gateway).await;

        let outcome = controller.send_text("Where is my order?").await.unwrap();
        let TurnOutcome::Degraded {
            user,
            apology,
            error,
        } = outcome
        else {
            panic!("Expected degraded outcome");
        };
        assert_eq!(error, TriageError::upstream(500, "boom"));

        let history = controller.history().await;
        let n = history.len();
        assert_eq!(history[n - 2].id(), user);
        assert_eq!(history[n - 2].text(), "Where is my order?");
        assert_eq!(history[n - 1].id(), apology);
        assert!(history[n - 1].is_bot());
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_image_request_flag_becomes_hint() {
        let gateway = Arc::new(MockGateway::default());
        gateway.push_chat(Ok(ChatTurnReply {
            response: "Could you send a photo of the receipt?".to_string(),
            requires_image: true,
            image_request: Some("Photo of the receipt".to_string()),
        }));
        let controller = chat_ready(gateway).await;

        let outcome = controller.send_text("Wrong item delivered").await.unwrap();
        let bot = controller.message(outcome.bot_message_id()).await.unwrap();
        assert!(bot.requests_image());
        assert_eq!(bot.image_prompt(), Some("Photo of the receipt"));
        assert_eq!(
            controller.latest_image_request().await,
            Some(outcome.bot_message_id())
        );
    }

    #[tokio::test]
    async fn test_send_before_chat_is_invalid() {
        let controller = controller(MockCatalog::new(), Arc::new(MockGateway::default()));
        controller.start().await.unwrap();

        let err = controller.send_text("hello").await.unwrap_err();
        assert!(matches!(err, TriageError::InvalidState { .. }));
        assert_eq!(controller.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let controller = chat_ready(Arc::new(MockGateway::default())).await;
        let before = controller.history().await.len();

        assert_eq!(
            controller.send_text("   ").await,
            Err(TriageError::EmptyInput("message"))
        );
        assert_eq!(controller.history().await.len(), before);
    }

    #[tokio::test]
    async fn test_overlapping_send_is_rejected() {
        let gateway = Arc::new(MockGateway::gated());
        let controller = Arc::new(chat_ready(gateway.clone()).await);
        let before = controller.history().await.len();

        let in_flight = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send_text("first").await })
        };
        gateway.entered.notified().await;
        assert!(controller.is_sending());

        let err = controller.send_text("second").await.unwrap_err();
        assert!(err.is_send_in_progress());
        // Only the in-flight user message was appended
        assert_eq!(controller.history().await.len(), before + 1);

        if let Some(release) = &gateway.release {
            release.notify_one();
        }
        let outcome = in_flight.await.unwrap().unwrap();
        assert!(outcome.is_answered());
        assert!(!controller.is_sending());
        assert_eq!(controller.history().await.len(), before + 2);
    }

    // ============================================================================
    // Image side channel and termination
    // ============================================================================

    #[tokio::test]
    async fn test_submit_image_targets_message() {
        let gateway = Arc::new(MockGateway::default());
        let controller = chat_ready(gateway.clone()).await;
        let target = controller.history().await[4].id();
        let state_before = controller.state().await;

        let outcome = controller
            .submit_image(target, ImageData::from_encoded("data:image/png;base64,aGk="))
            .await
            .unwrap();

        assert!(outcome.is_answered());
        assert_eq!(controller.state().await, state_before);
        let requests = gateway.image_requests.lock().unwrap().clone();
        assert_eq!(requests[0].message_id, target);
        assert_eq!(requests[0].image_data.as_str(), "aGk=");
        assert_eq!(requests[0].sub_issue.as_deref(), Some("late_delivery"));
    }

    #[tokio::test]
    async fn test_image_failure_appends_apology() {
        let gateway = Arc::new(MockGateway::default());
        *gateway.image_reply.lock().unwrap() = Some(Err(TriageError::upstream(413, "too large")));
        let controller = chat_ready(gateway).await;
        let before = controller.history().await;
        let target = before[4].id();

        let outcome = controller
            .submit_image(target, ImageData::from_bytes(b"jpeg"))
            .await
            .unwrap();

        assert!(!outcome.is_answered());
        let after = controller.history().await;
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
        assert!(after[before.len()].text().contains("image"));
        assert!(!controller.is_sending());
    }

    #[tokio::test]
    async fn test_image_for_unknown_message() {
        let controller = chat_ready(Arc::new(MockGateway::default())).await;
        let err = controller
            .submit_image(MessageId::new(7), ImageData::from_bytes(b"jpeg"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_terminate_blocks_further_operations() {
        let controller = chat_ready(Arc::new(MockGateway::default())).await;
        controller.terminate().await;

        assert_eq!(
            controller.state().await,
            ConversationState::Terminated(TerminationReason::NavigatedAway)
        );
        assert_eq!(controller.send_text("hello").await, Err(TriageError::Terminated));
        assert!(!controller.state().await.redirect_to_dashboard());
    }
}
