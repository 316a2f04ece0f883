//! In-memory repository adapters wired at startup.
//!
//! Article ingestion, a concrete LLM provider, and durable storage are all
//! external collaborators per spec.md §6 — this binary does not fetch RSS
//! feeds or call a real model. These adapters give the orchestrator something
//! to run against: an article queue seedable from a JSON file (`ARTICLE_SEED_PATH`),
//! and in-memory stores for Proposals and ShadowTrades, logged via `tracing`
//! so a run is observable without a dashboard.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    Analysis, Article, ArticleRepository, Holder, InsiderTrade, MarketDataClient, PipelineError,
    PriceHistory, Proposal, ProposalFilter, ProposalRepository, ProposalStatus, ShadowRepository,
    ShadowTrade,
};

#[derive(Default)]
pub struct InMemoryArticleQueue {
    pending: Mutex<Vec<Article>>,
    analyzed: Mutex<Vec<(String, Analysis)>>,
}

impl InMemoryArticleQueue {
    pub fn new(seed: Vec<Article>) -> Self {
        Self { pending: Mutex::new(seed), analyzed: Mutex::new(Vec::new()) }
    }

    /// Loads a JSON array of `Article` from disk, if `ARTICLE_SEED_PATH` is set.
    /// Absence of the variable (or the file) just means an empty queue — this
    /// binary has no ingestion collaborator of its own.
    pub fn from_env() -> anyhow::Result<Self> {
        let Ok(path) = std::env::var("ARTICLE_SEED_PATH") else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(&path)?;
        let articles: Vec<Article> = serde_json::from_str(&text)?;
        tracing::info!(count = articles.len(), path, "loaded article seed file");
        Ok(Self::new(articles))
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleQueue {
    async fn find_unprocessed(&self, limit: usize, since: DateTime<Utc>) -> Result<Vec<Article>, PipelineError> {
        let pending = self.pending.lock().unwrap();
        let mut matching: Vec<Article> =
            pending.iter().filter(|a| a.published_at >= since).cloned().collect();
        matching.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn mark_analyzed(&self, article_id: &str, analysis: &Analysis) -> Result<(), PipelineError> {
        self.pending.lock().unwrap().retain(|a| a.id != article_id);
        self.analyzed.lock().unwrap().push((article_id.to_string(), analysis.clone()));
        Ok(())
    }

    async fn load(&self, article_id: &str) -> Result<Article, PipelineError> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == article_id)
            .cloned()
            .ok_or_else(|| PipelineError::IngestFailure(format!("article {article_id} not found")))
    }
}

#[derive(Default)]
pub struct InMemoryProposalStore {
    saved: Mutex<Vec<Proposal>>,
}

#[async_trait]
impl ProposalRepository for InMemoryProposalStore {
    async fn save(&self, proposal: &Proposal) -> Result<(), PipelineError> {
        tracing::info!(
            id = %proposal.id,
            ticker = %proposal.ticker,
            status = ?proposal.status,
            constitutional = proposal.is_constitutional,
            "proposal recorded"
        );
        self.saved.lock().unwrap().push(proposal.clone());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: ProposalStatus, _metadata: serde_json::Value) -> Result<(), PipelineError> {
        let mut saved = self.saved.lock().unwrap();
        if let Some(proposal) = saved.iter_mut().find(|p| p.id == id) {
            proposal.status = status;
        }
        Ok(())
    }

    async fn list(&self, filter: ProposalFilter) -> Result<Vec<Proposal>, PipelineError> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .filter(|p| filter.ticker.as_deref().map_or(true, |t| p.ticker == t))
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryShadowStore {
    saved: Mutex<Vec<ShadowTrade>>,
}

#[async_trait]
impl ShadowRepository for InMemoryShadowStore {
    async fn save(&self, shadow: &ShadowTrade) -> Result<(), PipelineError> {
        tracing::info!(
            id = %shadow.id,
            ticker = %shadow.ticker,
            reason = %shadow.rejection_reason,
            "shadow trade opened"
        );
        self.saved.lock().unwrap().push(shadow.clone());
        Ok(())
    }

    async fn update(&self, shadow: &ShadowTrade) -> Result<(), PipelineError> {
        let mut saved = self.saved.lock().unwrap();
        if let Some(existing) = saved.iter_mut().find(|s| s.id == shadow.id) {
            *existing = shadow.clone();
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<ShadowTrade>, PipelineError> {
        use core_types::ShadowStatus;
        Ok(self.saved.lock().unwrap().iter().filter(|s| s.status == ShadowStatus::Tracking).cloned().collect())
    }
}

/// Deterministic flat-price feed for demonstration only — a real
/// `MarketDataClient` is an external collaborator (spec.md §6).
pub struct FlatMarketData {
    pub price: f64,
}

#[async_trait]
impl MarketDataClient for FlatMarketData {
    async fn get_current_price(&self, _ticker: &str) -> Result<f64, PipelineError> {
        Ok(self.price)
    }

    async fn get_history(&self, _ticker: &str, _period: &str) -> Result<PriceHistory, PipelineError> {
        Ok(PriceHistory { dates: Vec::new(), prices: Vec::new(), volumes: Vec::new() })
    }

    async fn get_institutional_holders(&self, _ticker: &str) -> Result<Vec<Holder>, PipelineError> {
        Ok(Vec::new())
    }

    async fn get_insider_trades(&self, _ticker: &str) -> Result<Vec<InsiderTrade>, PipelineError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SourceTier;

    fn article(id: &str, published_at: DateTime<Utc>) -> Article {
        Article {
            id: id.to_string(),
            ticker: Some("AAPL".to_string()),
            title: "title".to_string(),
            body: "body".to_string(),
            source_name: "Reuters".to_string(),
            source_tier: SourceTier::Major,
            published_at,
            url: None,
            sentiment: None,
        }
    }

    #[tokio::test]
    async fn find_unprocessed_respects_limit_and_recency() {
        let now = Utc::now();
        let queue = InMemoryArticleQueue::new(vec![
            article("old", now - chrono::Duration::hours(48)),
            article("recent-1", now - chrono::Duration::hours(1)),
            article("recent-2", now - chrono::Duration::minutes(30)),
        ]);
        let found = queue.find_unprocessed(10, now - chrono::Duration::hours(24)).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.id != "old"));
    }

    #[tokio::test]
    async fn mark_analyzed_removes_from_pending() {
        let now = Utc::now();
        let queue = InMemoryArticleQueue::new(vec![article("a1", now)]);
        let analysis = Analysis {
            article_id: "a1".to_string(),
            sentiment_label: core_types::SentimentLabel::Neutral,
            sentiment_score: 0.0,
            confidence: 0.5,
            urgency: core_types::Urgency::Low,
            impact_magnitude: 0.1,
            risk_category: core_types::RiskCategory::Low,
            trading_actionable: false,
            related_tickers: Vec::new(),
        };
        queue.mark_analyzed("a1", &analysis).await.unwrap();
        let found = queue.find_unprocessed(10, now - chrono::Duration::hours(1)).await.unwrap();
        assert!(found.is_empty());
    }
}
