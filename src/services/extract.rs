use crate::models::{Intent, StructuredSuggestion};

pub struct Extraction {
    pub clean_text: String,
    pub structured_data: Option<serde_json::Value>,
    pub suggestion: Option<StructuredSuggestion>,
}

impl Extraction {
    fn plain(text: &str) -> Self {
        Self {
            clean_text: text.to_string(),
            structured_data: None,
            suggestion: None,
        }
    }
}

/// Pull a structured suggestion out of a model reply, best effort. The model
/// is not contractually guaranteed to emit valid JSON, so every stage
/// degrades to plain text instead of propagating a parse error.
pub fn extract(raw_text: &str, intent: Intent) -> Extraction {
    if !intent.wants_suggestion() {
        return Extraction::plain(raw_text);
    }

    let (stripped, blocks) = split_fenced_blocks(raw_text);
    if blocks.is_empty() {
        return Extraction::plain(raw_text);
    }

    let structured_data = match serde_json::from_str::<serde_json::Value>(&blocks[0]) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            tracing::warn!("JSON block in model response is not an object, ignoring");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed JSON block in model response");
            None
        }
    };

    let suggestion = structured_data
        .as_ref()
        .and_then(StructuredSuggestion::from_value);

    let mut clean_text = stripped.trim().to_string();
    if clean_text.is_empty() && structured_data.is_some() {
        clean_text = match &suggestion {
            Some(s) => s.summary(),
            None => "Encontrei uma boa opção para a sua viagem.".to_string(),
        };
    }

    Extraction {
        clean_text,
        structured_data,
        suggestion,
    }
}

/// Split out every triple-backtick fenced block, returning the surrounding
/// prose and the block contents (language tags stripped). An unterminated
/// fence is left in the prose untouched.
fn split_fenced_blocks(text: &str) -> (String, Vec<String>) {
    let mut prose = String::new();
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let Some(end) = after.find("```") else {
            break;
        };

        prose.push_str(&rest[..start]);

        let mut content = after[..end].trim_start();
        if let Some(tagged) = content.strip_prefix("json") {
            if tagged.is_empty() || tagged.starts_with(char::is_whitespace) {
                content = tagged;
            }
        }
        blocks.push(content.trim().to_string());

        rest = &after[end + 3..];
    }

    prose.push_str(rest);
    (prose, blocks)
}
