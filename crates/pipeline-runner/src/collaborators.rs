//! Demonstration `Completer` and `SemanticRouter`.
//!
//! LLM invocation is an external collaborator (spec.md §1 non-goals): the core
//! never depends on a concrete provider. This binary ships only the `mock`
//! provider variant the spec calls out as sufficient for tests — it never
//! reaches the network. A real deployment supplies its own `Completer`
//! wired to whichever provider it prefers.

use async_trait::async_trait;
use core_types::{
    CompletionConfig, CompletionProvider, Completer, PipelineError, RoutingDecision,
    SemanticRouter, TokenUsage,
};

/// Always returns a fixed, well-formed Analysis JSON payload. Exists so the
/// demonstration loop has an end-to-end path without a real model; any
/// deployment replaces this with a `Completer` that calls out to a provider.
pub struct MockCompleter;

#[async_trait]
impl Completer for MockCompleter {
    async fn complete(&self, _prompt: &str, _config: &CompletionConfig) -> Result<(String, TokenUsage), PipelineError> {
        Ok((mock_analysis_json(), TokenUsage { prompt_tokens: 120, completion_tokens: 60 }))
    }

    async fn complete_with_system(&self, _system: &str, _user: &str, _config: &CompletionConfig) -> Result<(String, TokenUsage), PipelineError> {
        Ok((mock_analysis_json(), TokenUsage { prompt_tokens: 120, completion_tokens: 60 }))
    }
}

fn mock_analysis_json() -> String {
    r#"{"sentiment_label":"neutral","sentiment_score":0.1,"confidence":0.5,"urgency":"low","impact_magnitude":0.3,"risk_category":"medium","trading_actionable":false,"related_tickers":[]}"#.to_string()
}

/// Deterministic router that always recommends the mock provider at a fixed
/// token estimate. `SemanticRouter` is specified as a pure reader (§6); no
/// state, no I/O.
pub struct StaticRouter;

#[async_trait]
impl SemanticRouter for StaticRouter {
    async fn route(&self, request: &str) -> Result<RoutingDecision, PipelineError> {
        Ok(RoutingDecision {
            intent: "news_analysis".to_string(),
            provider: CompletionProvider::Mock,
            model: "mock-1".to_string(),
            estimated_tokens: (request.len() as u32 / 4).max(64),
            estimated_cost: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_completer_returns_parseable_json() {
        let completer = MockCompleter;
        let config = CompletionConfig {
            provider: CompletionProvider::Mock,
            model: "mock-1".to_string(),
            max_tokens: 256,
            temperature: 0.0,
            top_p: 1.0,
        };
        let (text, usage) = completer.complete("prompt", &config).await.unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
        assert!(usage.prompt_tokens > 0);
    }

    #[tokio::test]
    async fn static_router_is_deterministic() {
        let router = StaticRouter;
        let a = router.route("same request").await.unwrap();
        let b = router.route("same request").await.unwrap();
        assert_eq!(a.estimated_tokens, b.estimated_tokens);
        assert_eq!(a.model, b.model);
    }
}
