mod command;
mod helper;
mod logging;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;

use triage_application::ConversationController;
use triage_core::TriageError;
use triage_core::catalog::{Category, SubIssue};
use triage_core::session::{ConversationState, LaunchContext, Message, MessageHint, MessageId};
use triage_core::view::{MessageView, present};
use triage_core::widget::{DropdownWidget, MissingItemsWidget};
use triage_infrastructure::{ConfigStorage, TriagePaths, load_image};
use triage_interaction::SupportApiClient;

use command::ReplCommand;
use helper::CliHelper;

/// Guided customer-support chat in the terminal.
#[derive(Debug, Parser)]
#[command(name = "triage", version, about)]
struct Args {
    /// Service the issue is about (e.g. grab_food)
    #[arg(long)]
    service: Option<String>,

    /// Role within the service (e.g. customer, driver)
    #[arg(long)]
    user_type: Option<String>,

    #[arg(long)]
    username: Option<String>,

    /// Order the complaint refers to
    #[arg(long)]
    order_id: Option<String>,

    /// Support service URL, overriding config and TRIAGE_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Config file (defaults to ~/.config/triage/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// What a bare number refers to right now.
enum Choices {
    None,
    Categories(Vec<Category>),
    SubIssues(Vec<SubIssue>),
    MissingItems(MissingItemsWidget),
    Dropdown(DropdownWidget),
}

impl Choices {
    /// Derives the active choices from the history.
    ///
    /// While a menu step is pending its latest menu stays active even after
    /// an apology; otherwise only the latest bot message counts.
    fn current(state: ConversationState, history: &[Message]) -> Self {
        let mut bots = history.iter().rev().filter(|m| m.is_bot());
        match state {
            ConversationState::AwaitingCategory => bots
                .find_map(|m| match m.hint() {
                    MessageHint::OffersCategories(categories) => {
                        Some(Self::Categories(categories.clone()))
                    }
                    _ => None,
                })
                .unwrap_or(Self::None),
            ConversationState::AwaitingSubIssue => bots
                .find_map(|m| match m.hint() {
                    MessageHint::OffersSubIssues(sub_issues) => {
                        Some(Self::SubIssues(sub_issues.clone()))
                    }
                    _ => None,
                })
                .unwrap_or(Self::None),
            ConversationState::AwaitingChatInput => match bots.next().map(present) {
                Some(MessageView::MissingItems { widget, .. }) => Self::MissingItems(widget),
                Some(MessageView::Dropdown { widget, .. }) => Self::Dropdown(widget),
                _ => Self::None,
            },
            ConversationState::Bootstrapping | ConversationState::Terminated(_) => Self::None,
        }
    }

    /// Item numbers `/toggle` accepts right now.
    fn checklist(&self) -> Vec<u32> {
        match self {
            Self::MissingItems(widget) => widget
                .options()
                .iter()
                .map(|option| option.sequence_number)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The `triage` REPL.
///
/// 1. Loads the config file, applies environment and flag overrides
/// 2. Logs to a daily file under `~/.config/triage/logs/`
/// 3. Starts a conversation against the support service
/// 4. Reads lines until `/quit`, printing every new message
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logs_dir = TriagePaths::logs_dir().context("cannot resolve log directory")?;
    let _log_guard = logging::init(&logs_dir, args.verbose)?;

    // ===== Configuration =====
    let storage = match &args.config {
        Some(path) => ConfigStorage::with_path(path),
        None => ConfigStorage::new()?,
    };
    let mut config = storage.load()?;
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
        config.validate()?;
    }
    tracing::info!(target: "config", base_url = %config.api.base_url, "Configuration ready");

    // ===== Conversation =====
    let client = Arc::new(SupportApiClient::from_config(&config.api)?);
    let launch = LaunchContext {
        service: args.service,
        user_type: args.user_type,
        username: args.username,
        order_id: args.order_id,
    };
    let controller = ConversationController::new(launch, &config, client.clone(), client)?;

    let state = controller.state().await;
    if state.redirect_to_dashboard() {
        eprintln!(
            "{}",
            "No service or user type given. Start triage from an order with --service and --user-type."
                .red()
        );
        return Ok(());
    }

    println!("{}", "=== Triage Support Chat ===".bright_magenta().bold());
    println!(
        "{}",
        "Pick options by number. Commands: /toggle <n>, /submit, /image <path> [message-id], /history, /quit"
            .bright_black()
    );
    println!();

    controller.start().await?;
    let mut shown = print_new(&controller, 0).await;
    let mut choices = Choices::current(controller.state().await, &controller.history().await);

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    let mut helper = CliHelper::new();
    helper.set_checklist(choices.checklist());
    rl.set_helper(Some(helper));

    // ===== Main REPL Loop =====
    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        let result = match command::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::History => {
                for message in controller.history().await {
                    render::print_message(&message);
                }
                Ok(())
            }
            ReplCommand::Invalid(reason) => {
                println!("{}", reason.yellow());
                Ok(())
            }
            ReplCommand::Choose(number) => choose(&controller, &mut choices, number).await,
            ReplCommand::Toggle(number) => toggle(&mut choices, number),
            ReplCommand::Submit => match &mut choices {
                Choices::MissingItems(widget) => widget.submit(&controller).await.map(|_| ()),
                _ => {
                    println!("{}", "There is no checklist to submit.".yellow());
                    Ok(())
                }
            },
            ReplCommand::Image { path, message_id } => {
                attach_image(&controller, path, message_id).await
            }
            ReplCommand::Say(text) => controller.send_text(&text).await.map(|_| ()),
        };

        if let Err(e) = result {
            report(&e);
        }

        let before = shown;
        shown = print_new(&controller, shown).await;
        if shown > before {
            choices = Choices::current(controller.state().await, &controller.history().await);
            if let Some(helper) = rl.helper_mut() {
                helper.set_checklist(choices.checklist());
            }
        }
    }

    controller.terminate().await;
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

async fn choose(
    controller: &ConversationController,
    choices: &mut Choices,
    number: usize,
) -> triage_core::Result<()> {
    if matches!(choices, Choices::MissingItems(_)) {
        return toggle(choices, u32::try_from(number).unwrap_or(u32::MAX));
    }

    let index = number
        .checked_sub(1)
        .ok_or_else(|| TriageError::not_found("option", number.to_string()))?;

    match choices {
        Choices::Categories(categories) => {
            let category = categories
                .get(index)
                .ok_or_else(|| TriageError::not_found("category", number.to_string()))?;
            controller.select_category(&category.id).await.map(|_| ())
        }
        Choices::SubIssues(sub_issues) => {
            let sub_issue = sub_issues
                .get(index)
                .ok_or_else(|| TriageError::not_found("sub_issue", number.to_string()))?;
            controller.select_sub_issue(&sub_issue.id).await.map(|_| ())
        }
        Choices::Dropdown(widget) => widget.choose(index, controller).await.map(|_| ()),
        Choices::MissingItems(_) => Ok(()),
        Choices::None => controller.send_text(&number.to_string()).await.map(|_| ()),
    }
}

fn toggle(choices: &mut Choices, number: u32) -> triage_core::Result<()> {
    let Choices::MissingItems(widget) = choices else {
        println!("{}", "There is no checklist to toggle.".yellow());
        return Ok(());
    };
    widget.toggle(number)?;
    render::print_checklist(widget);
    Ok(())
}

async fn attach_image(
    controller: &ConversationController,
    path: PathBuf,
    message_id: Option<MessageId>,
) -> triage_core::Result<()> {
    let target = match message_id {
        Some(id) => id,
        None => controller
            .latest_image_request()
            .await
            .ok_or_else(|| TriageError::not_found("image request", "latest"))?,
    };
    let image = load_image(&path).await?;
    controller.submit_image(target, image).await.map(|_| ())
}

/// Prints history entries from `shown` on and returns the new count.
async fn print_new(controller: &ConversationController, shown: usize) -> usize {
    let history = controller.history().await;
    for message in history.iter().skip(shown) {
        render::print_message(message);
    }
    history.len()
}

fn report(error: &TriageError) {
    tracing::debug!(target: "triage", error = %error, "Command rejected");
    eprintln!("{}", format!("{error}").red());
}
