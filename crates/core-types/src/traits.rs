use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Analysis, Article, CompletionConfig, Holder, InsiderTrade, PipelineError, PriceHistory,
    Proposal, ProposalStatus, RoutingDecision, ShadowTrade, ShieldReport, TokenUsage,
};

/// Every intelligence component shares this shape: a single `analyze` entry point
/// plus a variant-tagged result. Concrete components (NewsFilter, FactChecker,
/// NarrativeStateEngine, ...) are named values selected by configuration, not
/// subclassed.
#[async_trait]
pub trait Intelligence: Send + Sync {
    type Input: Send + Sync;
    type Output: Send + Sync;

    async fn analyze(&self, input: Self::Input) -> Result<Self::Output, PipelineError>;
}

/// Source of unprocessed Articles and the sink for their Analyses.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find_unprocessed(
        &self,
        limit: usize,
        since: DateTime<Utc>,
    ) -> Result<Vec<Article>, PipelineError>;

    async fn mark_analyzed(&self, article_id: &str, analysis: &Analysis) -> Result<(), PipelineError>;

    async fn load(&self, article_id: &str) -> Result<Article, PipelineError>;
}

#[derive(Debug, Clone, Default)]
pub struct ProposalFilter {
    pub ticker: Option<String>,
    pub status: Option<ProposalStatus>,
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn save(&self, proposal: &Proposal) -> Result<(), PipelineError>;

    async fn update_status(
        &self,
        id: &str,
        status: ProposalStatus,
        metadata: serde_json::Value,
    ) -> Result<(), PipelineError>;

    async fn list(&self, filter: ProposalFilter) -> Result<Vec<Proposal>, PipelineError>;
}

#[async_trait]
pub trait ShadowRepository: Send + Sync {
    async fn save(&self, shadow: &ShadowTrade) -> Result<(), PipelineError>;
    async fn update(&self, shadow: &ShadowTrade) -> Result<(), PipelineError>;
    async fn list_active(&self) -> Result<Vec<ShadowTrade>, PipelineError>;
}

/// LLM invocation, abstracted away from any concrete provider. The mock variant
/// is sufficient for tests.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        config: &CompletionConfig,
    ) -> Result<(String, TokenUsage), PipelineError>;

    async fn complete_with_system(
        &self,
        system: &str,
        user: &str,
        config: &CompletionConfig,
    ) -> Result<(String, TokenUsage), PipelineError>;
}

/// Deterministic, pure-reader routing recommendation for a completion request.
#[async_trait]
pub trait SemanticRouter: Send + Sync {
    async fn route(&self, request: &str) -> Result<RoutingDecision, PipelineError>;
}

#[async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn get_current_price(&self, ticker: &str) -> Result<f64, PipelineError>;
    async fn get_history(&self, ticker: &str, period: &str) -> Result<PriceHistory, PipelineError>;
    async fn get_institutional_holders(&self, ticker: &str) -> Result<Vec<Holder>, PipelineError>;
    async fn get_insider_trades(&self, ticker: &str) -> Result<Vec<InsiderTrade>, PipelineError>;
}

/// The core calls into the sink; no replies are awaited.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_proposal(&self, proposal: &Proposal);
    async fn send_shield_report(&self, report: &ShieldReport);
}
