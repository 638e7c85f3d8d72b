//! Job-posting extraction protocol: prompts, the JSON wire shape, and the
//! defensive parser for model answers.

use jobnote_common::ExtractionFailure;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::traits::LlmError;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a helpful assistant designed to extract \
specific information from job postings and output it ONLY as a valid JSON object.";

pub const REWRITE_SYSTEM_PROMPT: &str = "You are a helpful assistant that reformats job \
descriptions into clean Markdown. Output only the formatted Markdown.";

/// Tunables for [`crate::LlmClient::extract_fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub max_input_chars: usize,
    pub temperature: f32,
}

/// Tunables for [`crate::LlmClient::format_description`].
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteSettings {
    pub max_input_chars: usize,
    pub temperature: f32,
}

/// Fields the model is asked to return.
///
/// Every key is optional on the wire. `null` reads as `""`, numbers and
/// booleans are stringified and arrays of strings are joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comp: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub req: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(scalar_to_string).unwrap_or_default())
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other @ Value::Object(_) => other.to_string(),
    }
}

/// One extraction round trip, kept only long enough to log and classify it.
#[derive(Debug)]
pub struct ExtractionAttempt {
    pub prompt: String,
    pub raw_response: Option<String>,
    pub outcome: Result<JobFields, ExtractionFailure>,
}

impl ExtractionAttempt {
    pub fn from_response(prompt: String, raw: String) -> Self {
        let outcome = parse_job_fields(&raw);
        Self {
            prompt,
            raw_response: Some(raw),
            outcome,
        }
    }

    pub fn from_error(prompt: String, err: &LlmError) -> Self {
        Self {
            prompt,
            raw_response: None,
            outcome: Err(ExtractionFailure::Backend(err.to_string())),
        }
    }

    pub fn log(&self) {
        match &self.outcome {
            Ok(fields) => tracing::info!(
                prompt_chars = self.prompt.chars().count(),
                company = %fields.company,
                role = %fields.role,
                description_chars = fields.description.chars().count(),
                "extraction succeeded"
            ),
            Err(failure) => tracing::warn!(
                prompt_chars = self.prompt.chars().count(),
                raw_response = self.raw_response.as_deref().unwrap_or(""),
                error = %failure,
                "extraction failed"
            ),
        }
    }

    pub fn into_result(self) -> Result<JobFields, ExtractionFailure> {
        self.outcome
    }
}

/// First `max_chars` characters of `text`, and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// Remove a surrounding ```` ```json ```` (or bare ```` ``` ````) fence.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Ok(re_fence) = Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?```$") else {
        return trimmed;
    };
    match re_fence.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a model answer into [`JobFields`].
pub fn parse_job_fields(raw: &str) -> Result<JobFields, ExtractionFailure> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ExtractionFailure::JsonDecode {
            message: "model returned an empty response".into(),
            raw: raw.to_string(),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| ExtractionFailure::JsonDecode {
        message: e.to_string(),
        raw: raw.to_string(),
    })?;
    if !value.is_object() {
        return Err(ExtractionFailure::JsonDecode {
            message: "expected a JSON object".into(),
            raw: raw.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| ExtractionFailure::JsonDecode {
        message: e.to_string(),
        raw: raw.to_string(),
    })
}

pub fn extraction_prompt(text: &str, source_url: &str) -> String {
    format!(
        r#"Analyze the following job posting text obtained from the URL "{source_url}".
Extract the specific information requested below.
Provide the output ONLY as a single valid JSON object with the following exact keys:
- "company": The name of the hiring company.
- "role": The specific job title or role.
- "location": The primary location(s) mentioned (e.g., "Chicago, IL", "Remote", "London, UK").
- "comp": The salary or compensation range if explicitly mentioned (e.g., "$100,000 - $120,000", "£50k"). Otherwise, "".
- "req": The requisition ID or job ID if explicitly mentioned. Otherwise, "".
- "description": The main body of the job description, duties, and qualifications as plain text. Preserve paragraph breaks with newline characters (\n).

If any piece of information is not found or cannot be determined, use an empty string "" for its value. Do not omit keys and do not use null. Ensure the entire output is a single, valid JSON object starting with {{ and ending with }}.

Job Posting Text:
---
{text}
---

JSON Output:"#
    )
}

pub fn rewrite_prompt(text: &str) -> String {
    format!(
        r#"Please reformat the following job description using Markdown elements to improve its structure and readability. Use headings (## or ### for sections like Responsibilities, Qualifications, About Us), bold text for emphasis (like **Required Skills:** or **Benefits**), and bullet points for lists where applicable. Separate paragraphs with blank lines. Output ONLY the formatted Markdown text. Do not add any introductory sentences, closing remarks, or explanations.

Original Plain Text Description:
---
{text}
---

Formatted Markdown Description:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"company\":\"Acme\",\"role\":\"Engineer\",\"location\":\"Remote\",\"comp\":\"\",\"req\":\"R-1\",\"description\":\"Build things.\"}\n```";
        let fields = parse_job_fields(raw).unwrap();
        assert_eq!(fields.company, "Acme");
        assert_eq!(fields.req, "R-1");
        assert_eq!(fields.description, "Build things.");
    }

    #[test]
    fn nulls_numbers_and_missing_keys_become_strings() {
        let fields =
            parse_job_fields(r#"{"company": null, "role": "Dev", "req": 4821, "location": ["Remote", "NYC"]}"#)
                .unwrap();
        assert_eq!(fields.company, "");
        assert_eq!(fields.req, "4821");
        assert_eq!(fields.location, "Remote, NYC");
        assert_eq!(fields.comp, "");
        assert_eq!(fields.description, "");
    }

    #[test]
    fn malformed_json_keeps_raw_output() {
        let err = parse_job_fields("Sure! Here is the data: {company: Acme").unwrap_err();
        match err {
            ExtractionFailure::JsonDecode { raw, .. } => assert!(raw.starts_with("Sure!")),
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn empty_and_non_object_answers_are_decode_failures() {
        assert!(matches!(
            parse_job_fields("   "),
            Err(ExtractionFailure::JsonDecode { .. })
        ));
        assert!(matches!(
            parse_job_fields("[1, 2]"),
            Err(ExtractionFailure::JsonDecode { .. })
        ));
    }

    #[test]
    fn strip_fence_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn truncation_counts_characters() {
        let (cut, truncated) = truncate_chars("héllo wörld", 5);
        assert_eq!(cut, "héllo");
        assert!(truncated);
        let (whole, truncated) = truncate_chars("short", 10);
        assert_eq!(whole, "short");
        assert!(!truncated);
    }

    #[test]
    fn extraction_prompt_names_every_key_and_url() {
        let prompt = extraction_prompt("text body", "https://jobs.example.com/1");
        for key in ["company", "role", "location", "comp", "req", "description"] {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing {key}");
        }
        assert!(prompt.contains("https://jobs.example.com/1"));
        assert!(prompt.contains("text body"));
    }
}
