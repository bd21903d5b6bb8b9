//! Best-effort extraction of a structured routine from a model reply.
//!
//! The reply is untrusted free text that usually, but not always, embeds a
//! JSON object. Extraction never fails: it yields either a parsed payload or
//! the reply itself.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Result of extracting a routine from a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedRoutine {
    /// A JSON object was found and parsed.
    Structured(RoutinePayload),
    /// Nothing parseable; carries the original reply.
    Raw(String),
}

/// The routine object the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutinePayload {
    #[serde(deserialize_with = "lenient_steps")]
    pub routine: Vec<SuggestedStep>,

    #[serde(deserialize_with = "lenient_text")]
    pub total_time: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub benefits: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub warnings: Option<String>,
}

/// One step as suggested by the model, before shelf resolution.
///
/// Any `productId` the model invents is ignored; ids only ever come from the
/// shelf.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestedStep {
    #[serde(deserialize_with = "lenient_order")]
    pub step: Option<u32>,

    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub product: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub wait_time: Option<String>,

    #[serde(deserialize_with = "lenient_text")]
    pub tips: Option<String>,
}

/// Extract a routine from a raw model reply.
pub fn extract_routine(reply: &str) -> ExtractedRoutine {
    let stripped = strip_code_fences(reply);

    let Some(span) = extract_json_span(&stripped) else {
        return ExtractedRoutine::Raw(reply.to_string());
    };

    match serde_json::from_str::<RoutinePayload>(span) {
        Ok(payload) => ExtractedRoutine::Structured(payload),
        Err(err) => {
            debug!("Routine JSON did not parse: {err}");
            ExtractedRoutine::Raw(reply.to_string())
        }
    }
}

/// Remove Markdown code-fence markers and trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// The span from the first `{` to the last `}`, inclusive.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<SuggestedStep>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_order<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn value_to_text(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
