//! Query and prompt construction

use crate::paper::GenerationRequest;
use serde_json::Value;

/// Shape the model must reproduce, shown verbatim in the prompt
const PAPER_SHAPE: &str = r#"{
  "title": "string",
  "abstract": "string",
  "introduction": "string",
  "sections": [{"title": "string", "content": "string"}],
  "conclusion": "string",
  "references": ["string"]
}"#;

/// Topic followed by the space-joined keywords
pub fn build_query(request: &GenerationRequest) -> String {
    let mut query = request.topic().to_string();
    for keyword in request.keywords() {
        query.push(' ');
        query.push_str(keyword);
    }
    query
}

/// Full generation prompt for one request and its search context
pub fn build_prompt(request: &GenerationRequest, context: &str) -> String {
    let mut prompt = format!(
        "You are an academic writing assistant. Write a research paper on the topic '{}'.\n\n",
        request.topic()
    );

    let mut requirements = Vec::new();
    if !request.keywords().is_empty() {
        requirements.push(format!("Keywords: {}", request.keywords().join(", ")));
    }
    push_if_set(&mut requirements, "Target audience", request.audience());
    push_if_set(&mut requirements, "Tone", request.tone());
    if let Some(length) = describe_page_length(request.page_length()) {
        requirements.push(format!("Length: {}", length));
    }
    push_if_set(&mut requirements, "Citation style", request.citation_style());
    push_if_set(&mut requirements, "Output format", request.output_format());

    if !requirements.is_empty() {
        prompt.push_str("Requirements:\n");
        for line in requirements {
            prompt.push_str("- ");
            prompt.push_str(&line);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str("Use the following sources:\n\n");
    if context.is_empty() {
        prompt.push_str("(no web sources were found; rely on established knowledge)\n");
    } else {
        prompt.push_str(context);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nRespond with ONLY a single JSON object matching exactly this shape:\n",
    );
    prompt.push_str(PAPER_SHAPE);
    prompt.push_str(
        "\n\nEvery field is required. `sections` must contain objects with non-empty `content`. \
         `references` is a list of citation strings formatted in the requested citation style. \
         Do not wrap the JSON in markdown code fences and do not add any text before or after it.",
    );

    prompt
}

fn push_if_set(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.trim().is_empty() {
        lines.push(format!("{}: {}", label, value));
    }
}

/// Render the opaque length hint for the prompt
fn describe_page_length(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}
