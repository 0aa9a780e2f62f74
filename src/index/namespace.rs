use regex::Regex;
use std::sync::LazyLock;

const NAMESPACE_PREFIX: &str = "research_";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 由调研主题推导语义索引的命名空间：忽略大小写，连续空白折叠为 `_`
pub fn namespace_for_topic(topic: &str) -> String {
    let normalized = topic.trim().to_lowercase();
    format!(
        "{}{}",
        NAMESPACE_PREFIX,
        WHITESPACE_RUN.replace_all(&normalized, "_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_is_case_insensitive() {
        assert_eq!(
            namespace_for_topic("AI in Healthcare"),
            namespace_for_topic("ai IN healthcare")
        );
        assert_eq!(namespace_for_topic("AI in Healthcare"), "research_ai_in_healthcare");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(namespace_for_topic("  X \t Y\n"), "research_x_y");
    }

    #[test]
    fn test_different_topics_differ() {
        assert_ne!(namespace_for_topic("X Y"), namespace_for_topic("Z"));
    }
}
