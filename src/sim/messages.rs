//! Status line text
//!
//! Rendering is a pure function of the category, the substitutions and the
//! random source, so a seeded RNG reproduces the exact lines.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::settings::MessageTemplates;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    Start,
    Progress,
    Mismatch,
    Win,
}

impl MessageCategory {
    /// Line used when no templates are configured
    pub fn default_template(self) -> &'static str {
        match self {
            MessageCategory::Start => "{name}, find all the matching pairs!",
            MessageCategory::Progress => "Great work, {name}! {found} / {total} pairs found.",
            MessageCategory::Mismatch => "Try again, {name}!",
            MessageCategory::Win => {
                "✨ Incredible, {name}! You matched them all. Hit restart to play again."
            }
        }
    }
}

impl MessageTemplates {
    pub fn for_category(&self, category: MessageCategory) -> &[String] {
        match category {
            MessageCategory::Start => &self.start,
            MessageCategory::Progress => &self.progress,
            MessageCategory::Mismatch => &self.mismatch,
            MessageCategory::Win => &self.win,
        }
    }
}

/// Values substituted into a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitutions<'a> {
    pub name: &'a str,
    pub found: u32,
    pub total: u32,
}

/// Pick a template uniformly and fill in the placeholders
pub fn render_status<R: Rng + ?Sized>(
    category: MessageCategory,
    templates: &MessageTemplates,
    subs: &Substitutions<'_>,
    rng: &mut R,
) -> String {
    let template = templates
        .for_category(category)
        .choose(rng)
        .map(String::as_str)
        .unwrap_or_else(|| category.default_template());
    fill(template, subs)
}

fn fill(template: &str, subs: &Substitutions<'_>) -> String {
    template
        .replace("{name}", subs.name)
        .replace("{found}", &subs.found.to_string())
        .replace("{total}", &subs.total.to_string())
}
