use crate::error::AppError;
use crate::models::InsightResult;

/// Returns the first balanced top-level `{...}` block in free text. Braces
/// inside JSON string literals are ignored.
pub fn extract_json_block(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in content[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turns a model reply into insights. A reply without any JSON object yields
/// empty lists; an object that does not parse is an error.
pub fn parse_reply(content: &str) -> Result<InsightResult, AppError> {
    match extract_json_block(content) {
        Some(block) => serde_json::from_str(block).map_err(|e| {
            tracing::error!("Model reply is not valid insight JSON: {}", e);
            AppError::MalformedReply(e.to_string())
        }),
        None if content.contains('{') => Err(AppError::MalformedReply(
            "unbalanced JSON object in reply".to_string(),
        )),
        None => {
            tracing::warn!("Model reply contained no JSON object");
            Ok(InsightResult::default())
        }
    }
}
