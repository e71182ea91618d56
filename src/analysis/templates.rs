//! Prompt templates, one per insight kind.
//!
//! Templates use `{content}` for the (truncated) email text. The summary
//! template may also use `{style}`, which is resolved once when the set is
//! built so the resolved template doubles as the cache key component.

use crate::models::{InsightKind, SummaryStyle};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const CONTENT_PLACEHOLDER: &str = "{content}";
pub const STYLE_PLACEHOLDER: &str = "{style}";

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("Template override for unknown insight kind '{0}'")]
    UnknownKind(String),

    #[error("Template for '{0}' must contain {{content}}")]
    MissingPlaceholder(String),
}

/// Built-in template for a kind.
pub fn default_template(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Summary => {
            "Analyze the following email content and provide a summary in {style} style.\n\
             Include key entities (names, dates, and terms) and generate actionable next steps:\n\n\
             {content}"
        }
        InsightKind::KeyEntities => {
            "Extract key entities (names, dates, important terms) from the following text:\n\n\
             {content}"
        }
        InsightKind::ActionItems => {
            "List the concrete action items and next steps requested in the following email, \
             one per line. If there are none, answer 'None'.\n\n\
             {content}"
        }
        InsightKind::Tone => {
            "Describe the tone of the following email (for example formal, friendly, \
             frustrated, apologetic) in one or two sentences:\n\n\
             {content}"
        }
        InsightKind::Urgency => {
            "Rate the urgency of the following email as Low, Medium or High and give a \
             one-sentence reason:\n\n\
             {content}"
        }
        InsightKind::Sentiment => {
            "Assess the overall sentiment of the following email (positive, neutral or \
             negative) and explain briefly:\n\n\
             {content}"
        }
        InsightKind::Response => {
            "Draft a short, professional reply to the following email:\n\n\
             {content}"
        }
        InsightKind::Category => {
            "Classify the following email into exactly one category (meeting, request, \
             update, complaint, newsletter, personal, other). Answer with the category only.\n\n\
             {content}"
        }
        InsightKind::Questions => {
            "List the questions the sender of the following email is asking, one per line. \
             If there are none, answer 'None'.\n\n\
             {content}"
        }
    }
}

/// Resolved templates for every insight kind.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: HashMap<InsightKind, String>,
}

impl TemplateSet {
    /// Built-in templates with the given summary style.
    pub fn new(style: SummaryStyle) -> Self {
        let templates = InsightKind::ALL
            .iter()
            .map(|&kind| (kind, resolve(default_template(kind), style)))
            .collect();
        Self { templates }
    }

    /// Built-in templates with per-kind overrides keyed by insight id.
    pub fn with_overrides(
        style: SummaryStyle,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let mut set = Self::new(style);

        for (key, template) in overrides {
            let kind: InsightKind = key
                .parse()
                .map_err(|_| TemplateError::UnknownKind(key.clone()))?;

            if !template.contains(CONTENT_PLACEHOLDER) {
                return Err(TemplateError::MissingPlaceholder(kind.id().to_string()));
            }

            set.templates.insert(kind, resolve(template, style));
        }

        Ok(set)
    }

    /// The resolved template for `kind`.
    pub fn template(&self, kind: InsightKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| default_template(kind))
    }

    /// Embed `content` into the template for `kind`.
    pub fn render(&self, kind: InsightKind, content: &str) -> String {
        self.template(kind).replace(CONTENT_PLACEHOLDER, content)
    }
}

fn resolve(template: &str, style: SummaryStyle) -> String {
    template.replace(STYLE_PLACEHOLDER, style.prompt_phrase())
}
