//! Grounding prompt for review questions.

use handlebars::Handlebars;
use ragscope_core::{AppError, AppResult};
use serde::Serialize;

/// Default template: the question followed by numbered review excerpts.
pub const GROUNDED_TEMPLATE: &str = "You are a hospitality analyst. Answer the question using only \
the customer reviews below. If the reviews do not cover it, say so.

Question: {{question}}

Reviews:
{{#each reviews}}
{{@index}}. {{this}}
{{/each}}
Answer:";

#[derive(Serialize)]
struct GroundedVars<'a> {
    question: &'a str,
    reviews: &'a [String],
}

/// Render the default grounding prompt.
pub fn build_grounded_prompt(question: &str, reviews: &[String]) -> AppResult<String> {
    render_template(GROUNDED_TEMPLATE, question, reviews)
}

/// Render a custom Handlebars template exposing `question` and `reviews`.
pub fn render_template(template: &str, question: &str, reviews: &[String]) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Reviews are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("grounded", template)
        .map_err(|e| AppError::Llm(format!("Failed to register prompt template: {}", e)))?;

    handlebars
        .render("grounded", &GroundedVars { question, reviews })
        .map_err(|e| AppError::Llm(format!("Failed to render prompt template: {}", e)))
}
