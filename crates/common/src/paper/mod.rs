//! Paper domain types
//!
//! `GenerationRequest` is what callers submit; `GeneratedPaper` is the only
//! shape a successful generation can take. Conversion from model output is
//! strict: the first missing or mistyped field aborts with `SchemaMismatch`.

use crate::errors::{AppError, Result};
use crate::extract::json_kind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Top-level fields every generated paper must carry, in validation order
pub const REQUIRED_FIELDS: [&str; 6] = [
    "title",
    "abstract",
    "introduction",
    "sections",
    "conclusion",
    "references",
];

/// One run's worth of paper configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    topic: String,
    keywords: Vec<String>,
    audience: String,
    tone: String,
    page_length: Value,
    citation_style: String,
    output_format: String,
    owner_id: Uuid,
}

/// Builder-style inputs for `GenerationRequest::new`
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub audience: String,
    pub tone: String,
    pub page_length: Value,
    pub citation_style: String,
    pub output_format: String,
}

impl GenerationRequest {
    /// Create a request; the topic must contain non-whitespace text
    pub fn new(
        owner_id: Uuid,
        topic: impl Into<String>,
        keywords: Vec<String>,
        options: RequestOptions,
    ) -> Result<Self> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(AppError::Validation {
                message: "topic must not be empty".to_string(),
                field: Some("topic".to_string()),
            });
        }

        Ok(Self {
            topic,
            keywords,
            audience: options.audience,
            tone: options.tone,
            page_length: options.page_length,
            citation_style: options.citation_style,
            output_format: options.output_format,
            owner_id,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn tone(&self) -> &str {
        &self.tone
    }

    pub fn page_length(&self) -> &Value {
        &self.page_length
    }

    pub fn citation_style(&self) -> &str {
        &self.citation_style
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Titled body section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

/// A fully validated generated paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPaper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub introduction: String,
    pub sections: Vec<Section>,
    pub conclusion: String,
    pub references: Vec<String>,
}

impl GeneratedPaper {
    /// Validate an extracted JSON object and build the paper from it
    pub fn from_json_object(obj: &Map<String, Value>) -> Result<Self> {
        let title = required_string(obj, "title")?;
        let abstract_text = required_string(obj, "abstract")?;
        let introduction = required_string(obj, "introduction")?;
        let sections = required_sections(obj)?;
        let conclusion = required_string(obj, "conclusion")?;
        let references = required_references(obj)?;

        Ok(Self {
            title,
            abstract_text,
            introduction,
            sections,
            conclusion,
            references,
        })
    }

    /// Complete serialized form stored as the record's full text
    pub fn to_full_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

fn mismatch(field: impl Into<String>, reason: impl Into<String>) -> AppError {
    AppError::SchemaMismatch {
        field: field.into(),
        reason: reason.into(),
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    obj.get(field)
        .ok_or_else(|| mismatch(field, "missing required field"))
}

fn required_string(obj: &Map<String, Value>, field: &str) -> Result<String> {
    match required(obj, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(mismatch(
            field,
            format!("expected a string, found {}", json_kind(other)),
        )),
    }
}

fn required_sections(obj: &Map<String, Value>) -> Result<Vec<Section>> {
    let items = match required(obj, "sections")? {
        Value::Array(items) => items,
        other => {
            return Err(mismatch(
                "sections",
                format!("expected an array, found {}", json_kind(other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let section = item.as_object().ok_or_else(|| {
                mismatch(
                    format!("sections[{}]", i),
                    format!("expected an object, found {}", json_kind(item)),
                )
            })?;

            let title = match section.get("title") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => {
                    return Err(mismatch(
                        format!("sections[{}].title", i),
                        format!("expected a string, found {}", json_kind(other)),
                    ))
                }
                None => return Err(mismatch(format!("sections[{}].title", i), "missing required field")),
            };

            let content = match section.get("content") {
                Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
                Some(Value::String(_)) => {
                    return Err(mismatch(format!("sections[{}].content", i), "must not be empty"))
                }
                Some(other) => {
                    return Err(mismatch(
                        format!("sections[{}].content", i),
                        format!("expected a string, found {}", json_kind(other)),
                    ))
                }
                None => {
                    return Err(mismatch(format!("sections[{}].content", i), "missing required field"))
                }
            };

            Ok(Section { title, content })
        })
        .collect()
}

fn required_references(obj: &Map<String, Value>) -> Result<Vec<String>> {
    let items = match required(obj, "references")? {
        Value::Array(items) => items,
        other => {
            return Err(mismatch(
                "references",
                format!("expected an array, found {}", json_kind(other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(
                format!("references[{}]", i),
                format!("expected a string, found {}", json_kind(other)),
            )),
        })
        .collect()
}
