//! 从模型的自由文本输出中提取 JSON 对象
//!
//! 第一步定位成对的大括号片段（忽略字符串字面量中的括号），
//! 第二步反序列化为目标类型。两步的失败分别报告为不同的错误。

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GenerationError;

const EXCERPT_CHARS: usize = 120;

/// 从 `start` 处的 `{` 开始，找到与之配对的 `}` 的字节位置
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// 按出现顺序列出所有最外层的成对大括号片段
pub fn balanced_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('{') {
        let start = cursor + found;
        match balanced_end(text, start) {
            Some(end) => {
                candidates.push(&text[start..=end]);
                cursor = end + 1;
            }
            None => cursor = start + 1,
        }
    }
    candidates
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head)
}

/// 提取第一个能被解析为 JSON 对象的片段
pub fn extract_json_object(text: &str) -> Result<Value, GenerationError> {
    let candidates = balanced_candidates(text);
    if candidates.is_empty() {
        return Err(GenerationError::NoJsonObject {
            excerpt: excerpt(text),
        });
    }

    let mut last_error = None;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value @ Value::Object(_)) => return Ok(value),
            Ok(_) => {}
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(GenerationError::InvalidJson {
        detail: last_error.unwrap_or_else(|| "no candidate parsed as an object".to_string()),
    })
}

/// 提取 JSON 对象并反序列化为 `T`
pub fn extract_structured<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    extract_validated(text, Ok)
}

/// 依次尝试每个候选片段，返回第一个能反序列化为 `T` 且通过 `validate` 的结果。
/// 都不匹配时，只要有片段解析成了对象就报告第一个结构错误，否则报告非法 JSON。
pub fn extract_validated<T, R, F>(text: &str, mut validate: F) -> Result<R, GenerationError>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<R, GenerationError>,
{
    let candidates = balanced_candidates(text);
    if candidates.is_empty() {
        return Err(GenerationError::NoJsonObject {
            excerpt: excerpt(text),
        });
    }

    let mut schema_error = None;
    let mut parse_error = None;
    for candidate in candidates {
        let value = match serde_json::from_str::<Value>(candidate) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => continue,
            Err(e) => {
                parse_error = Some(e.to_string());
                continue;
            }
        };

        let outcome = serde_json::from_value::<T>(value)
            .map_err(|e| GenerationError::SchemaMismatch {
                detail: e.to_string(),
            })
            .and_then(&mut validate);
        match outcome {
            Ok(accepted) => return Ok(accepted),
            Err(e) => {
                schema_error.get_or_insert(e);
            }
        }
    }

    Err(schema_error.unwrap_or_else(|| GenerationError::InvalidJson {
        detail: parse_error.unwrap_or_else(|| "no candidate parsed as an object".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Plan {
        queries: Vec<String>,
    }

    #[test]
    fn test_extracts_object_surrounded_by_reasoning() {
        let text = r#"Let me think about this.
Here is the plan: {"queries": ["a", "b", "c"]}
Hope that helps!"#;

        let plan: Plan = extract_structured(text).unwrap();
        assert_eq!(plan.queries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"queries": ["use {curly} braces", "escaped \" quote }", "x"]}"#;
        let plan: Plan = extract_structured(text).unwrap();
        assert_eq!(plan.queries[0], "use {curly} braces");
        assert_eq!(plan.queries[1], "escaped \" quote }");
    }

    #[test]
    fn test_nested_objects_return_outermost() {
        let text = r#"result: {"outer": {"inner": 1}, "queries": []} done"#;
        let value = extract_json_object(text).unwrap();
        assert!(value.get("outer").is_some());
        assert!(value.get("queries").is_some());
    }

    #[test]
    fn test_skips_unparseable_candidate() {
        let text = r#"Thinking {not json at all} ... final: {"queries": ["q1", "q2", "q3"]}"#;
        let plan: Plan = extract_structured(text).unwrap();
        assert_eq!(plan.queries.len(), 3);
    }

    #[test]
    fn test_skips_draft_object_that_does_not_fit() {
        let text = r#"The format is {"queries": "..."} so the final answer is:
{"queries": ["a", "b", "c"]}"#;
        let plan: Plan = extract_structured(text).unwrap();
        assert_eq!(plan.queries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_schema_mismatch_reported_when_no_candidate_fits() {
        let text = r#"{"queries": "one"} then {"query": ["a"]}"#;
        let err = extract_structured::<Plan>(text).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaMismatch { .. }));

        let err = extract_structured::<Plan>("{queries: [a]}").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));

        let err = extract_structured::<Plan>("no braces here").unwrap_err();
        assert!(matches!(err, GenerationError::NoJsonObject { .. }));
    }

    #[test]
    fn test_no_object_found() {
        let err = extract_json_object("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, GenerationError::NoJsonObject { .. }));

        let err = extract_json_object("unterminated {\"queries\": [").unwrap_err();
        assert!(matches!(err, GenerationError::NoJsonObject { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = extract_json_object("{queries: [a, b]}").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));
    }

    #[test]
    fn test_schema_mismatch() {
        let err = extract_structured::<Plan>(r#"{"queries": "one string"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaMismatch { .. }));
    }
}
