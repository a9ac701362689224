//! Patch extraction from model output
//!
//! Models rarely return the bare JSON array they were asked for; the text
//! usually arrives wrapped in markdown fences or prose. This module recovers
//! the patch: strip fences, trim to the outermost `[` .. `]`, parse each
//! element. A malformed element is dropped with a logged reason; it does not
//! abort the batch.

use crate::error::ProposeError;
use apimend_patch::EditOperation;

/// Extract edit operations from raw model output
///
/// # Errors
/// Returns [`ProposeError::InvalidResponse`] when no JSON array can be found
/// or the array itself does not parse. Individually malformed operations are
/// dropped, not errors.
pub fn extract_operations(text: &str) -> Result<Vec<EditOperation>, ProposeError> {
    let candidate = strip_fences(text);
    let array = trim_to_array(candidate).ok_or_else(|| ProposeError::InvalidResponse {
        message: "no JSON array found in response".to_string(),
    })?;

    let elements: Vec<serde_json::Value> =
        serde_json::from_str(array).map_err(|e| ProposeError::InvalidResponse {
            message: format!("patch array does not parse: {e}"),
        })?;

    let mut operations = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match serde_json::from_value::<EditOperation>(element) {
            Ok(op) => operations.push(op),
            Err(e) => {
                tracing::warn!(index, reason = %e, "dropping malformed proposed operation");
            }
        }
    }
    Ok(operations)
}

/// Pull the content out of a ```json fenced block, if there is one
fn strip_fences(text: &str) -> &str {
    let fenced = text
        .split_once("```json")
        .or_else(|| text.split_once("```"))
        .map(|(_, rest)| rest);
    match fenced {
        Some(rest) => rest.split("```").next().unwrap_or(rest),
        None => text,
    }
    .trim()
}

/// Trim leading/trailing prose around the outermost array
fn trim_to_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimend_patch::EditKind;

    const PLAIN_PATCH: &str = r#"[
        {"op": "add", "path": "/security", "value": [{"bearerAuth": []}]},
        {"op": "add", "path": "/components/securitySchemes",
         "value": {"bearerAuth": {"type": "http", "scheme": "bearer"}}}
    ]"#;

    #[test]
    fn bare_array_parses() {
        let ops = extract_operations(PLAIN_PATCH).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind(), EditKind::Add);
        assert_eq!(ops[0].path().to_string(), "/security");
    }

    #[test]
    fn json_fenced_block_parses() {
        let text = format!("Here is the patch:\n```json\n{PLAIN_PATCH}\n```\nDone.");
        let ops = extract_operations(&text).unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn anonymous_fence_parses() {
        let text = format!("```\n{PLAIN_PATCH}\n```");
        let ops = extract_operations(&text).unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn surrounding_prose_is_trimmed() {
        let text = format!("Sure! Apply these operations: {PLAIN_PATCH} and re-audit.");
        let ops = extract_operations(&text).unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn malformed_single_operation_is_dropped() {
        let text = r#"[
            {"op": "add", "path": "/a", "value": 1},
            {"op": "teleport", "path": "/b", "value": 2},
            {"op": "remove", "path": "/c"}
        ]"#;
        let ops = extract_operations(text).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].kind(), EditKind::Remove);
    }

    #[test]
    fn no_array_is_invalid_response() {
        let result = extract_operations("I could not produce a patch, sorry.");
        assert!(matches!(result, Err(ProposeError::InvalidResponse { .. })));
    }

    #[test]
    fn broken_array_is_invalid_response() {
        let result = extract_operations(r#"[{"op": "add", "path": "/a", "#);
        assert!(matches!(result, Err(ProposeError::InvalidResponse { .. })));
    }

    #[test]
    fn empty_array_is_ok_and_empty() {
        let ops = extract_operations("[]").unwrap();
        assert!(ops.is_empty());
    }
}
