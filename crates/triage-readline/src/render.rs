//! Terminal rendering of conversation messages.

use colored::{ColoredString, Colorize};
use triage_core::format::{FormattedMessage, LineKind, Span};
use triage_core::session::Message;
use triage_core::view::{MessageView, present};
use triage_core::widget::MissingItemsWidget;

pub fn print_message(message: &Message) {
    if !message.is_bot() {
        println!("{}", format!("> {}", message.text()).green());
        return;
    }

    match present(message) {
        MessageView::Formatted(body) => print_formatted(&body),
        MessageView::CategoryChoices { body, categories } => {
            print_formatted(&body);
            for (index, category) in categories.iter().enumerate() {
                println!("  {} {}", format!("[{}]", index + 1).bright_cyan(), category.name);
            }
        }
        MessageView::SubIssueChoices { body, sub_issues } => {
            print_formatted(&body);
            for (index, sub_issue) in sub_issues.iter().enumerate() {
                println!("  {} {}", format!("[{}]", index + 1).bright_cyan(), sub_issue.name);
            }
        }
        MessageView::ImageRequest { body, prompt } => {
            print_formatted(&body);
            let hint = prompt.unwrap_or_else(|| "Attach a photo".to_string());
            println!(
                "{}",
                format!("📷 {hint} (use /image <path>, message {})", message.id()).yellow()
            );
        }
        MessageView::MissingItems { caption, widget } => {
            if let Some(order) = widget.order() {
                println!(
                    "{}",
                    format!("Order {} from {}", order.order_id, order.store_name).bright_black()
                );
            }
            println!("{}", caption.bright_blue());
            print_checklist(&widget);
            println!(
                "{}",
                "Toggle items with their number or /toggle <n>, then /submit.".bright_black()
            );
        }
        MessageView::Dropdown { caption, widget } => {
            if let Some(title) = widget.title() {
                println!("{}", title.bold().bright_blue());
            }
            println!("{}", caption.bright_blue());
            for (index, option) in widget.options().iter().enumerate() {
                println!("  {} {}", format!("[{}]", index + 1).bright_cyan(), option.label);
            }
        }
    }
}

pub fn print_checklist(widget: &MissingItemsWidget) {
    for option in widget.options() {
        let mark = if widget.is_selected(option.sequence_number) {
            "☑".green()
        } else {
            "☐".normal()
        };
        println!("  {mark} {}. {}", option.sequence_number, option.label);
    }
}

fn print_formatted(body: &FormattedMessage) {
    for (index, paragraph) in body.paragraphs.iter().enumerate() {
        if index > 0 {
            println!();
        }
        for line in &paragraph.lines {
            let text: String = line.spans.iter().map(|span| style_span(span).to_string()).collect();
            match &line.kind {
                LineKind::Text => println!("{text}"),
                LineKind::SectionHeader { emoji } => println!("{emoji} {}", text.bold().yellow()),
                LineKind::Bullet => println!("  • {text}"),
                LineKind::Numbered { number } => println!("  {number}. {text}"),
                LineKind::Checkbox => println!("  ☐ {text}"),
                LineKind::Checkmark => println!("  {} {text}", "✓".green()),
            }
        }
    }
}

fn style_span(span: &Span) -> ColoredString {
    match span {
        Span::Text(text) => text.bright_blue(),
        Span::Bold(text) => text.bright_blue().bold(),
        Span::Link(url) => url.cyan().underline(),
        Span::BoldLink(url) => url.cyan().underline().bold(),
    }
}
