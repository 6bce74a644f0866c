//! Intent gate ahead of the conversation loop.
//!
//! One cheap classification call decides whether a query is small talk or a
//! research request. The gate never fails a query: when classification
//! itself cannot run, the query proceeds conversationally and the condition
//! is surfaced as a status note.

use nexus_llm::{FallbackExecutor, ModelRequest};

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Small talk or a general question.
    Chat,
    /// A request to look up people, businesses, or information.
    Search,
}

/// Outcome of classifying one query.
#[derive(Debug, Clone)]
pub struct Classification {
    /// The decided intent.
    pub intent: Intent,
    /// Status note for the event stream when classification degraded.
    pub note: Option<String>,
}

fn classification_prompt(query: &str) -> String {
    format!(
        "Classify the following user query as CHAT or SEARCH.\n\
         CHAT means a greeting or general conversation.\n\
         SEARCH means a request to find people, businesses, or information.\n\
         Query: \"{query}\"\n\
         Respond with exactly one word: CHAT or SEARCH."
    )
}

/// Label a query with one fallback-protected model call.
///
/// Any reply mentioning SEARCH routes to the research loop; everything
/// else, including model failures, is treated as chat.
pub async fn classify(executor: &FallbackExecutor, query: &str) -> Classification {
    let request = ModelRequest::from_text(classification_prompt(query));

    match executor.generate(&request).await {
        Ok(response) => {
            let label = response.text().trim().to_uppercase();
            let intent = if label.contains("SEARCH") {
                Intent::Search
            } else {
                Intent::Chat
            };
            tracing::debug!(query, label = %label, ?intent, "Query classified");
            Classification { intent, note: None }
        }
        Err(e) => {
            tracing::warn!(query, error = %e, "Intent classification failed, treating as chat");
            Classification {
                intent: Intent::Chat,
                note: Some(
                    "Could not determine intent; answering conversationally.".to_string(),
                ),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use nexus_llm::{FallbackPolicy, LlmError, MockBackend, ModelResponse};

    fn executor(backend: MockBackend) -> FallbackExecutor {
        FallbackExecutor::new(
            Arc::new(backend),
            FallbackPolicy::new(vec!["m1".to_string(), "m2".to_string()]).unwrap(),
        )
    }

    #[tokio::test]
    async fn search_label_routes_to_search() {
        let exec = executor(MockBackend::with_text("SEARCH"));
        let classification = classify(&exec, "find me fintech leads").await;

        assert_eq!(classification.intent, Intent::Search);
        assert!(classification.note.is_none());
    }

    #[tokio::test]
    async fn verbose_reply_containing_search_still_routes_to_search() {
        let exec = executor(MockBackend::with_text(
            "I believe this is a search request.",
        ));
        let classification = classify(&exec, "who runs TechFlow?").await;

        assert_eq!(classification.intent, Intent::Search);
    }

    #[tokio::test]
    async fn chat_label_routes_to_chat() {
        let exec = executor(MockBackend::with_text("CHAT"));
        let classification = classify(&exec, "hello there").await;

        assert_eq!(classification.intent, Intent::Chat);
        assert!(classification.note.is_none());
    }

    #[tokio::test]
    async fn unrecognized_label_defaults_to_chat() {
        let exec = executor(MockBackend::with_text("GREETING"));
        let classification = classify(&exec, "good morning").await;

        assert_eq!(classification.intent, Intent::Chat);
    }

    #[tokio::test]
    async fn quota_exhaustion_falls_back_before_giving_up() {
        let backend = MockBackend::scripted(vec![
            Err(LlmError::QuotaExhausted("429".to_string())),
            Ok(ModelResponse::text_reply("m2", "SEARCH")),
        ]);
        let exec = executor(backend);

        let classification = classify(&exec, "find CTOs in fintech").await;
        assert_eq!(classification.intent, Intent::Search);
        assert!(classification.note.is_none());
    }

    #[tokio::test]
    async fn total_failure_fails_open_to_chat_with_note() {
        let backend = MockBackend::scripted(vec![
            Err(LlmError::QuotaExhausted("429".to_string())),
            Err(LlmError::QuotaExhausted("429".to_string())),
        ]);
        let exec = executor(backend);

        let classification = classify(&exec, "find CTOs in fintech").await;
        assert_eq!(classification.intent, Intent::Chat);
        assert!(classification.note.unwrap().contains("conversationally"));
    }

    #[tokio::test]
    async fn fatal_error_also_fails_open_to_chat() {
        let backend =
            MockBackend::scripted(vec![Err(LlmError::Auth("bad api key".to_string()))]);
        let exec = executor(backend);

        let classification = classify(&exec, "find CTOs in fintech").await;
        assert_eq!(classification.intent, Intent::Chat);
        assert!(classification.note.is_some());
    }
}
