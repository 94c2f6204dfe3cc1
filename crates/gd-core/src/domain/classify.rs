use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ClassifyError;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sanitation,
    Roads,
    Electricity,
    Water,
    LawAndOrder,
    Other,
    Irrelevant,
}

impl Category {
    /// Categories that map to a department. `Irrelevant` never routes; it
    /// terminates intake before persistence.
    pub const ROUTABLE: [Category; 6] = [
        Category::Sanitation,
        Category::Roads,
        Category::Electricity,
        Category::Water,
        Category::LawAndOrder,
        Category::Other,
    ];

    pub fn is_routable(self) -> bool {
        self != Category::Irrelevant
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sanitation => "sanitation",
            Category::Roads => "roads",
            Category::Electricity => "electricity",
            Category::Water => "water",
            Category::LawAndOrder => "law_and_order",
            Category::Other => "other",
            Category::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification — validated classifier output
// ---------------------------------------------------------------------------

/// A classifier verdict that passed field validation. `confidence` is always
/// within 0..=100; out-of-range model output never constructs this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub priority: Priority,
    pub sentiment: Sentiment,
    pub summary: String,
    pub confidence: u8,
}

// ---------------------------------------------------------------------------
// Model output parsing
// ---------------------------------------------------------------------------

/// Raw wire shape the model is instructed to emit (Deserialize only).
#[derive(serde::Deserialize)]
struct ClassificationWire {
    category: String,
    priority: String,
    sentiment: String,
    summary: String,
    confidence: i64,
}

/// Parse and validate the completion content returned by the model.
///
/// Models still wrap the object in Markdown code fences despite instructions,
/// so incidental fences are stripped before parsing. Everything else is
/// strict: unknown enum tokens, a missing field, or a confidence outside
/// 0..=100 all fail as `Malformed`. Values are never clamped or repaired.
pub fn parse_model_output(raw: &str) -> Result<Classification, ClassifyError> {
    let body = strip_code_fences(raw);

    let wire: ClassificationWire = serde_json::from_str(body)
        .map_err(|e| ClassifyError::Malformed(format!("invalid JSON: {e}")))?;

    let confidence = match u8::try_from(wire.confidence) {
        Ok(v) if v <= 100 => v,
        _ => {
            return Err(ClassifyError::Malformed(format!(
                "confidence out of range: {}",
                wire.confidence
            )))
        }
    };

    Ok(Classification {
        category: parse_category(&wire.category)?,
        priority: parse_priority(&wire.priority)?,
        sentiment: parse_sentiment(&wire.sentiment)?,
        summary: wire.summary,
        confidence,
    })
}

/// Strip a leading/trailing Markdown code fence, with or without a language
/// tag. Content without fences passes through untouched.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence line (may carry a language tag such as `json`).
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim().strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_category(s: &str) -> Result<Category, ClassifyError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "sanitation" => Ok(Category::Sanitation),
        "roads" => Ok(Category::Roads),
        "electricity" => Ok(Category::Electricity),
        "water" => Ok(Category::Water),
        "law_and_order" | "law & order" | "law and order" => Ok(Category::LawAndOrder),
        "other" => Ok(Category::Other),
        "irrelevant" => Ok(Category::Irrelevant),
        other => Err(ClassifyError::Malformed(format!(
            "unknown category: {other}"
        ))),
    }
}

fn parse_priority(s: &str) -> Result<Priority, ClassifyError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        other => Err(ClassifyError::Malformed(format!(
            "unknown priority: {other}"
        ))),
    }
}

fn parse_sentiment(s: &str) -> Result<Sentiment, ClassifyError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "negative" => Ok(Sentiment::Negative),
        "neutral" => Ok(Sentiment::Neutral),
        "positive" => Ok(Sentiment::Positive),
        other => Err(ClassifyError::Malformed(format!(
            "unknown sentiment: {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
