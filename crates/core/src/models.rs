use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous window of document words, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Query,
    Draft,
    Final,
    Suggestion,
}

/// The unit passed between pipeline stages. All structure lives in the
/// content text, not in typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub source: String,
    pub checksum: String,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Exact-match query rewrite entry. Matching is case-insensitive on the
/// whole trimmed query, deliberately not a general synonym engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRewrite {
    pub triggers: Vec<String>,
    pub rewritten: String,
}

impl QueryRewrite {
    pub fn matches(&self, query: &str) -> bool {
        let lowered = query.trim().to_lowercase();
        self.triggers
            .iter()
            .any(|trigger| trigger.to_lowercase() == lowered)
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub chunk_words: usize,
    pub overlap_words: usize,
    pub top_k: usize,
    pub rewrites: Vec<QueryRewrite>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            chunk_words: 1_000,
            overlap_words: 200,
            top_k: 4,
            rewrites: vec![QueryRewrite {
                triggers: vec![
                    "summary".to_string(),
                    "summarize".to_string(),
                    "overview".to_string(),
                ],
                rewritten: "Please provide a clear summary of the key benefits, \
                            waiting periods, and exclusions in the policy document."
                    .to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_matches_whole_query_case_insensitively() {
        let rewrite = QueryRewrite {
            triggers: vec!["summary".to_string()],
            rewritten: "canned".to_string(),
        };

        assert!(rewrite.matches("Summary"));
        assert!(rewrite.matches("  summary "));
        assert!(!rewrite.matches("a summary of fees"));
    }

    #[test]
    fn default_options_carry_summary_shortcut() {
        let options = RetrievalOptions::default();
        assert_eq!(options.top_k, 4);
        assert!(options.rewrites.iter().any(|r| r.matches("overview")));
    }
}
