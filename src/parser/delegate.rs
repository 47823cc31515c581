//! Delegated extraction through an external text-understanding service.
//!
//! The service receives a fixed prompt built by [`build_prompt`] and answers
//! with JSON that [`interpret_response`] turns into a [`ParsedQuery`]. Any
//! error here is recoverable: the parser falls back to pattern matching.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde_json::Value;

use super::numeric::parse_number;
use crate::model::{Intent, ParsedQuery, QuantityRange, QuantityType, Strategy, TemporalConstraint};

/// Confidence when the response does not state one.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Errors from a delegate call or its response.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    #[error("Delegate not configured: {0}")]
    NotConfigured(String),

    #[error("Delegate request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Delegate API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Delegate returned an empty response")]
    EmptyResponse,

    #[error("Malformed delegate response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for DelegateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DelegateError::Timeout
        } else if err.is_decode() {
            DelegateError::Malformed(err.to_string())
        } else {
            DelegateError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DelegateError {
    fn from(err: serde_json::Error) -> Self {
        DelegateError::Malformed(err.to_string())
    }
}

pub type DelegateResult<T> = Result<T, DelegateError>;

/// An external service that completes a prompt.
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Identifies what answers this delegate gives, for cache partitioning.
    /// Two delegates with the same fingerprint must be interchangeable.
    fn fingerprint(&self) -> String {
        self.name().to_string()
    }

    /// Send `prompt` and return the raw text of the answer.
    async fn complete(&self, prompt: &str) -> DelegateResult<String>;
}

/// Build the extraction prompt for `query`.
///
/// The quantity list, canonical units and accepted units come from the
/// conversion tables, so the prompt always matches what the compiler knows.
pub fn build_prompt(query: &str) -> String {
    let quoted = serde_json::to_string(query).unwrap_or_else(|_| format!("\"{}\"", query));

    let mut quantities = String::new();
    for q in QuantityType::ALL {
        let units: Vec<&str> = q.conversions().iter().map(|c| c.unit).collect();
        let _ = writeln!(
            quantities,
            "   - \"{}\": canonical unit {}; accepted units: {}",
            q.name(),
            q.canonical_unit(),
            units.join(", ")
        );
    }

    format!(
        r#"You are a plasma physics query parser. Extract structured information from this query:

Query: {quoted}

Extract the following in JSON format:
1. intent: "search" (find papers), "statistics" (get stats), or "compare" (compare values)
2. parameters: object keyed by quantity, only for these quantities:
{quantities}   each containing:
   - min_value: minimum value (number or null)
   - max_value: maximum value (number or null)
   - unit: the unit exactly as stated in the query
3. keywords: list of physics domain keywords (e.g. ["tokamak", "plasma", "confinement"])
4. temporal_constraint: "recent" (last 2 years), "YYYY" (specific year), or null
5. confidence: your confidence in the extraction, between 0 and 1

Handle scientific notation like:
- "10^16 to 10^18 m^-3" -> min_value: 1e16, max_value: 1e18
- "2.5 x 10^19 m^-3" -> 2.5e19
- "between 5 and 10 keV" -> min_value: 5, max_value: 10
- "above 10 keV" -> min_value: 10, max_value: null
- "below 100 eV" -> min_value: null, max_value: 100

Return ONLY valid JSON, no markdown:
{{
  "intent": "search",
  "parameters": {{
    "temperature": {{"min_value": 5.0, "max_value": 10.0, "unit": "keV"}},
    "density": {{"min_value": 1e16, "max_value": 1e18, "unit": "m^-3"}}
  }},
  "keywords": ["plasma", "electron"],
  "temporal_constraint": "recent",
  "confidence": 0.9
}}"#
    )
}

/// Remove markdown fences and any chatter around the JSON object.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (```json) along with the fence.
        body = rest.split_once('\n').map_or("", |(_, after)| after);
        body = body.trim_end();
        body = body.strip_suffix("```").unwrap_or(body).trim();
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// A numeric field: a JSON number, or a string in any accepted notation.
///
/// `Ok(None)` for null or missing, `Err(())` for something unreadable.
fn numeric_field(value: Option<&Value>) -> Result<Option<f64>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(()),
        Some(Value::String(s)) if s.trim().is_empty() || s.trim() == "null" => Ok(None),
        Some(Value::String(s)) => parse_number(s).map(Some).ok_or(()),
        Some(_) => Err(()),
    }
}

/// Turn a delegate answer into a [`ParsedQuery`] for `query`.
///
/// Lenient where it can be: malformed bounds drop their range, unknown
/// quantities become keywords, unknown intents become [`Intent::Search`].
/// Only a response that is not a JSON object is an error.
pub fn interpret_response(query: &str, raw: &str) -> DelegateResult<ParsedQuery> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(DelegateError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(body)?;
    let Value::Object(root) = value else {
        return Err(DelegateError::Malformed("expected a JSON object".into()));
    };

    let mut parsed = ParsedQuery::empty(query);
    parsed.strategy = Strategy::Delegated;
    parsed.raw_response = Some(raw.to_string());
    parsed.intent = root
        .get("intent")
        .and_then(Value::as_str)
        .and_then(Intent::from_name)
        .unwrap_or_default();

    let mut penalty = 0.0;
    if let Some(Value::Object(parameters)) = root.get("parameters") {
        for (name, data) in parameters {
            let Some(quantity) = QuantityType::from_name(name) else {
                parsed.add_keyword(name);
                continue;
            };
            let Value::Object(data) = data else {
                continue;
            };
            let (Ok(min), Ok(max)) = (
                numeric_field(data.get("min_value")),
                numeric_field(data.get("max_value")),
            ) else {
                tracing::debug!(quantity = %quantity, "dropping range with malformed bound");
                continue;
            };
            let unit = data
                .get("unit")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(quantity.canonical_unit());
            if let Some(range) = QuantityRange::new(quantity, min, max, unit) {
                let known = range.has_known_unit();
                if parsed.add_range(range) && !known {
                    penalty += 0.1;
                }
            }
        }
    }

    match root.get("keywords") {
        Some(Value::Array(items)) => {
            for item in items.iter().filter_map(Value::as_str) {
                parsed.add_keyword(item);
            }
        }
        Some(Value::String(single)) => parsed.add_keyword(single),
        _ => {}
    }

    parsed.temporal_constraint = match root.get("temporal_constraint") {
        Some(Value::String(s)) => s.parse::<TemporalConstraint>().ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .filter(|y| (1000..=9999).contains(y))
            .map(|y| TemporalConstraint::Year(y as i32)),
        _ => None,
    };

    let stated = root
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE);
    parsed.set_confidence(stated - penalty);

    Ok(parsed)
}
