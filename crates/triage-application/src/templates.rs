//! Rendering of the messages the client writes on its own behalf.

use minijinja::Environment;
use serde::Serialize;
use triage_core::config::TemplateConfig;
use triage_core::session::ConversationSession;
use triage_core::{Result, TriageError};

/// Human-readable name of a service id.
///
/// Known Grab services map to their brand names; anything else is
/// title-cased word by word (`food_delivery` becomes `Food Delivery`).
pub fn service_display_name(service: &str) -> String {
    match service {
        "grab_food" => "GrabFood".to_string(),
        "grab_cabs" => "GrabCabs".to_string(),
        "grab_mart" => "GrabMart".to_string(),
        "grab_express" => "GrabExpress".to_string(),
        other => other
            .split(['_', '-', ' '])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Variables available to every template.
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    pub username: &'a str,
    pub service: &'a str,
    pub service_name: String,
    pub user_type: &'a str,
    pub category: Option<&'a str>,
    pub sub_issue: Option<&'a str>,
}

impl<'a> TemplateContext<'a> {
    pub fn from_session(session: &'a ConversationSession) -> Self {
        let context = session.context();
        Self {
            username: &context.username,
            service: &context.service,
            service_name: service_display_name(&context.service),
            user_type: &context.user_type,
            category: session.selected_category().map(|c| c.name.as_str()),
            sub_issue: session.selected_sub_issue().map(|s| s.name.as_str()),
        }
    }
}

/// Compiled view over `TemplateConfig`.
pub struct MessageTemplates {
    env: Environment<'static>,
    templates: TemplateConfig,
}

impl MessageTemplates {
    /// Checks that every template parses.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Template` naming the first broken template.
    pub fn new(templates: TemplateConfig) -> Result<Self> {
        // Parsing borrows the sources, so it gets its own environment.
        {
            let scratch = Environment::new();
            for (name, source) in [
                ("greeting", &templates.greeting),
                ("sub_issue_prompt", &templates.sub_issue_prompt),
                ("describe_issue", &templates.describe_issue),
                ("catalog_apology", &templates.catalog_apology),
                ("chat_apology", &templates.chat_apology),
                ("image_apology", &templates.image_apology),
            ] {
                parse(&scratch, source).map_err(|e| match e {
                    TriageError::Template(detail) => {
                        TriageError::Template(format!("templates.{name}: {detail}"))
                    }
                    other => other,
                })?;
            }
        }
        Ok(Self {
            env: Environment::new(),
            templates,
        })
    }

    pub fn greeting(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("greeting", &self.templates.greeting, ctx)
    }

    pub fn sub_issue_prompt(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("sub_issue_prompt", &self.templates.sub_issue_prompt, ctx)
    }

    pub fn describe_issue(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("describe_issue", &self.templates.describe_issue, ctx)
    }

    pub fn catalog_apology(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("catalog_apology", &self.templates.catalog_apology, ctx)
    }

    pub fn chat_apology(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("chat_apology", &self.templates.chat_apology, ctx)
    }

    pub fn image_apology(&self, ctx: &TemplateContext<'_>) -> String {
        self.render("image_apology", &self.templates.image_apology, ctx)
    }

    // A template that parsed can still fail at render time (e.g. a filter
    // applied to the wrong type); the raw source is better than nothing.
    fn render(&self, name: &str, source: &str, ctx: &TemplateContext<'_>) -> String {
        match self.env.render_str(source, ctx) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(target: "conversation", template = name, error = %e, "Template render failed");
                source.to_string()
            }
        }
    }
}

fn parse<'s>(env: &Environment<'s>, source: &'s str) -> Result<()> {
    env.template_from_str(source)?;
    Ok(())
}
