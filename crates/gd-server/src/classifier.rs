use std::time::Duration;

use gd_core::domain::{parse_model_output, ApiKey, Classification, ClassifyError, ModelId};

// ---------------------------------------------------------------------------
// ClassifierSettings — validated outbound configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ClassifierSettings {
    pub base_url: String,
    pub api_key: Option<ApiKey>,
    pub model: ModelId,
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// ClassifierClient — single-attempt chat-completion call
// ---------------------------------------------------------------------------

/// The instruction the model receives with every submission. Relevance is
/// judged before categorization so gibberish and off-topic input land in
/// `irrelevant` instead of being force-fitted into a civic category.
const SYSTEM_INSTRUCTION: &str = "\
You triage citizen grievances for a municipal government. First decide whether \
the message is a genuine civic grievance (sanitation, roads, electricity, \
water supply, law and order, or another municipal matter). Then respond with \
exactly one JSON object and nothing else, no Markdown fences, using this \
shape: {\"category\": \"sanitation|roads|electricity|water|law_and_order|other|irrelevant\", \
\"priority\": \"high|medium|low\", \"sentiment\": \"negative|neutral|positive\", \
\"summary\": \"<one sentence>\", \"confidence\": <integer 0-100>}. \
If the message is gibberish, spam, or not a civic matter, set category to \
\"irrelevant\" and explain why in the summary.";

pub struct ClassifierClient {
    http: reqwest::Client,
    settings: ClassifierSettings,
}

impl ClassifierClient {
    pub fn new(settings: ClassifierSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    /// Classify one grievance description.
    ///
    /// One outbound call, no retry. A missing credential fails before any
    /// network I/O. Every failure mode maps onto `ClassifyError`; nothing
    /// escapes this boundary as a panic or a fabricated classification.
    pub async fn classify(&self, description: &str) -> Result<Classification, ClassifyError> {
        let Some(api_key) = &self.settings.api_key else {
            return Err(ClassifyError::MissingCredential);
        };

        let url = format!("{}/v1/chat/completions", self.settings.base_url);
        let body = build_request_body(&self.settings.model, description);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClassifyError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let content = extract_completion_content(&text)?;
        parse_model_output(&content)
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn build_request_body(model: &ModelId, description: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model.as_str(),
        "messages": [
            {"role": "system", "content": SYSTEM_INSTRUCTION},
            {"role": "user", "content": description},
        ],
        "temperature": 0,
        "stream": false,
    })
}

// Response wire types (Deserialize only — for parsing the completion envelope)

#[derive(serde::Deserialize)]
struct CompletionWire {
    choices: Vec<ChoiceWire>,
}

#[derive(serde::Deserialize)]
struct ChoiceWire {
    message: MessageWire,
}

#[derive(serde::Deserialize)]
struct MessageWire {
    content: Option<String>,
}

fn extract_completion_content(body: &str) -> Result<String, ClassifyError> {
    let wire: CompletionWire = serde_json::from_str(body)
        .map_err(|e| ClassifyError::Malformed(format!("invalid completion envelope: {e}")))?;

    wire.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ClassifyError::Malformed("completion carried no content".to_owned()))
}
