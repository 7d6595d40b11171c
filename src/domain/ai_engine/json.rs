//! Tolerant JSON recovery for model output.
//!
//! Even in strict-JSON mode some models wrap the object in code fences or
//! prepend a sentence. Recovery strips fences and pulls out the first
//! balanced top-level object; callers still validate the result with serde.

/// Extracts the first balanced `{...}` object from model output.
///
/// Returns `None` when no balanced object exists. String literals are
/// respected so braces inside values do not unbalance the scan.
pub fn extract_json_object(content: &str) -> Option<String> {
    let stripped = strip_code_fences(content);

    let start = stripped.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in stripped[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(stripped[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes markdown code fences, keeping the fenced body.
fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}
