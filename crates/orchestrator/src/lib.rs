//! Pipeline Orchestrator (component J).
//!
//! The single long-lived supervisor that drives one cycle: pull unprocessed
//! Articles, analyze them (bounded concurrent fan-out), feed the Clustering
//! Engine, generate and de-duplicate TradingSignals, validate and
//! constitutionally gate them into Proposals, and notify. Owns every other
//! component's mutable state; callers never share it directly.

mod parsing;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use constitution::Constitution;
use core_types::{
    Analysis, ArticleRepository, CompletionConfig, Completer, MarketContext, NotificationSink,
    PipelineError, Proposal, ProposalRepository, ProposalStatus, SemanticRouter, ShadowRepository,
    SignalAction, TradingSignal,
};
use futures_util::stream::{self, StreamExt};
use news_clustering::ClusteringEngine;
use shadow_tracker::ShadowTracker;
use signal_generator::SignalGenerator;
use signal_validator::SignalValidator;

/// `cluster.*` configuration keys; `ClusteringEngine::new` takes these as
/// positional arguments rather than its own settings type.
#[derive(Debug, Clone, Copy)]
pub struct ClusterSettings {
    pub time_window_minutes: i64,
    pub min_size: usize,
    pub max_age_hours: i64,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self { time_window_minutes: 60, min_size: 2, max_age_hours: 48 }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub max_per_cycle: usize,
    pub analysis_concurrency: usize,
    pub dedup_window_minutes: i64,
    pub bootstrap_skip_allocation: bool,
    pub cluster: ClusterSettings,
    pub generator: signal_generator::GeneratorSettings,
    pub validator: signal_validator::ValidatorSettings,
    pub shadow: shadow_tracker::ShadowTrackerSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_per_cycle: 10,
            analysis_concurrency: 5,
            dedup_window_minutes: 30,
            bootstrap_skip_allocation: false,
            cluster: ClusterSettings::default(),
            generator: signal_generator::GeneratorSettings::default(),
            validator: signal_validator::ValidatorSettings::default(),
            shadow: shadow_tracker::ShadowTrackerSettings::default(),
        }
    }
}

/// Per-cycle counters (§4.J step 9).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub articles_processed: u64,
    pub analyses_generated: u64,
    pub signals_generated: u64,
    pub duplicates_dropped: u64,
    pub low_quality_dropped: u64,
    pub validator_rejected: u64,
    pub constitution_rejected: u64,
    pub proposals_created: u64,
    pub shadow_trades_created: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost: f64,
}

/// Drives one full cycle end to end. Owns the Clustering Engine, Signal
/// Generator, Signal Validator, Constitution, and Shadow Tracker; the
/// repositories, Completer, SemanticRouter, and NotificationSink are supplied
/// collaborators.
pub struct PipelineOrchestrator {
    articles: Arc<dyn ArticleRepository>,
    proposals: Arc<dyn ProposalRepository>,
    shadows: Arc<dyn ShadowRepository>,
    completer: Arc<dyn Completer>,
    router: Arc<dyn SemanticRouter>,
    notifier: Arc<dyn NotificationSink>,

    settings: OrchestratorSettings,
    clustering: Mutex<ClusteringEngine>,
    generator: Mutex<SignalGenerator>,
    validator: Mutex<SignalValidator>,
    constitution: Constitution,
    shadow_tracker: Mutex<ShadowTracker>,
    recent_signals: Mutex<HashMap<String, DateTime<Utc>>>,
    stats: Mutex<CycleStats>,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        proposals: Arc<dyn ProposalRepository>,
        shadows: Arc<dyn ShadowRepository>,
        completer: Arc<dyn Completer>,
        router: Arc<dyn SemanticRouter>,
        notifier: Arc<dyn NotificationSink>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            articles,
            proposals,
            shadows,
            completer,
            router,
            notifier,
            clustering: Mutex::new(ClusteringEngine::new(
                settings.cluster.time_window_minutes,
                settings.cluster.min_size,
                settings.cluster.max_age_hours,
            )),
            generator: Mutex::new(SignalGenerator::new(settings.generator.clone())),
            validator: Mutex::new(SignalValidator::new(settings.validator.clone())),
            constitution: Constitution::new(),
            shadow_tracker: Mutex::new(ShadowTracker::new(settings.shadow.clone())),
            settings,
            recent_signals: Mutex::new(HashMap::new()),
            stats: Mutex::new(CycleStats::default()),
        }
    }

    pub fn statistics(&self) -> CycleStats {
        self.stats.lock().unwrap().clone()
    }

    /// SHA-256 digest of the Constitution's rule source, for the binary's
    /// startup integrity check (spec.md §6): a deployment pins this digest and
    /// refuses to start if the live rule blocks ever diverge from it.
    pub fn constitution_digest(&self) -> &str {
        self.constitution.rule_source_digest()
    }

    pub fn shield_report(&self, window_days: i64, now: DateTime<Utc>) -> core_types::ShieldReport {
        self.shadow_tracker.lock().unwrap().shield_report(window_days, now)
    }

    /// Marks every active shadow trade to market (§4.I `update_all`), persisting
    /// each change through the `ShadowRepository`, then reaps shadows past their
    /// tracking window. Driven on its own cadence by the caller, independent of
    /// `run_cycle` — the Shadow Tracker needs fresh prices even on cycles where
    /// no new Proposal was rejected.
    pub async fn update_shadows(&self, market_data: &dyn core_types::MarketDataClient, now: DateTime<Utc>) -> Result<(), PipelineError> {
        let tickers_and_prices: Vec<(String, f64)> = {
            let tracker = self.shadow_tracker.lock().unwrap();
            let mut pairs = Vec::new();
            for shadow in tracker.active_shadows() {
                pairs.push((shadow.ticker.clone(), 0.0));
            }
            pairs
        };

        let mut priced = HashMap::new();
        for (ticker, _) in tickers_and_prices {
            if priced.contains_key(&ticker) {
                continue;
            }
            let price = market_data.get_current_price(&ticker).await?;
            priced.insert(ticker, price);
        }

        let updated = {
            let mut tracker = self.shadow_tracker.lock().unwrap();
            tracker.update_all(now, |ticker| priced.get(ticker).copied());
            tracker.close_expired_shadows(now);
            tracker.all_shadows().to_vec()
        };

        for shadow in updated {
            self.shadows.update(&shadow).await?;
        }
        Ok(())
    }

    /// Executes one full cycle against `context` (the market snapshot the
    /// Constitution validates proposals against). Returns the Proposals
    /// produced this cycle, approved and rejected alike.
    pub async fn run_cycle(&self, now: DateTime<Utc>, context: &MarketContext) -> Result<Vec<Proposal>, PipelineError> {
        let since = now - Duration::hours(24);
        let articles = self.articles.find_unprocessed(self.settings.max_per_cycle, since).await?;

        // Step 2: bounded concurrent fan-out — analyze each Article and persist
        // its Analysis. A single failed article is logged and skipped, not fatal.
        let concurrency = self.settings.analysis_concurrency;
        let analyses: Vec<(core_types::Article, Analysis)> = stream::iter(articles)
            .map(|article| self.analyze_one(article))
            .buffer_unordered(concurrency)
            .filter_map(|result| async move {
                match result {
                    Ok(pair) => Some(pair),
                    Err(e) => {
                        tracing::warn!(error = %e, "article analysis failed, skipping");
                        None
                    }
                }
            })
            .collect()
            .await;

        {
            let mut stats = self.stats.lock().unwrap();
            stats.cycles += 1;
            stats.articles_processed += analyses.len() as u64;
            stats.analyses_generated += analyses.len() as u64;
        }

        let mut proposals = Vec::new();

        for (article, mut analysis) in analyses {
            // Step 3: feed the clustering engine; fold the verdict's confidence
            // multiplier and cooling window into this analysis.
            {
                let mut clustering = self.clustering.lock().unwrap();
                if let Some(cluster) = clustering.add_article(article.clone(), now) {
                    analysis.confidence = (analysis.confidence * cluster.confidence_multiplier).clamp(0.0, 1.0);
                    if cluster.confidence_multiplier <= 0.0 || cluster.is_cooling(now) {
                        analysis.trading_actionable = false;
                    }
                }
            }

            // Step 4: only trading_actionable analyses continue.
            if !analysis.trading_actionable {
                continue;
            }

            let signal = { self.generator.lock().unwrap().generate_signal(&analysis) };
            let Some(signal) = signal else { continue };
            self.stats.lock().unwrap().signals_generated += 1;

            // Step 5: per-cycle dedup, ticker + bucketed-minute key.
            if self.is_duplicate(&signal, now) {
                self.stats.lock().unwrap().duplicates_dropped += 1;
                continue;
            }

            // Step 6: quality filter.
            if signal.confidence < 0.6 || signal.position_size < 0.01 {
                self.stats.lock().unwrap().low_quality_dropped += 1;
                continue;
            }

            // Step 7: validate, then constitution-check.
            let outcome = { self.validator.lock().unwrap().validate_signal(&signal, context.total_capital, now) };
            if !outcome.is_approved() {
                self.stats.lock().unwrap().validator_rejected += 1;
                continue;
            }

            let proposal = self.build_proposal(&signal, context, now);
            let verdict = self.constitution.validate_proposal(&proposal, context, self.settings.bootstrap_skip_allocation);

            let mut proposal = proposal;
            proposal.is_constitutional = verdict.is_valid;
            proposal.violated_articles = verdict.cited_articles.clone();
            proposal.status = if verdict.is_valid { ProposalStatus::Pending } else { ProposalStatus::Rejected };

            if !verdict.is_valid {
                self.stats.lock().unwrap().constitution_rejected += 1;
            }

            self.proposals.save(&proposal).await?;
            self.stats.lock().unwrap().proposals_created += 1;

            // Step 8: notify, and shadow-track rejections.
            self.notifier.send_proposal(&proposal).await;
            if !verdict.is_valid {
                let shadow = {
                    let mut tracker = self.shadow_tracker.lock().unwrap();
                    tracker.create(
                        format!("shadow-{}", proposal.id),
                        Some(proposal.id.clone()),
                        proposal.ticker.clone(),
                        proposal.action,
                        proposal.target_price,
                        proposal.shares,
                        format!("constitution rejected: {}", verdict.violations.join("; ")),
                        verdict.cited_articles.clone(),
                        None,
                        now,
                    )
                };
                self.shadows.save(&shadow).await?;
                self.stats.lock().unwrap().shadow_trades_created += 1;
            }

            proposals.push(proposal);
        }

        Ok(proposals)
    }

    async fn analyze_one(&self, article: core_types::Article) -> Result<(core_types::Article, Analysis), PipelineError> {
        let routing = self.router.route(&article.title).await?;
        let config = CompletionConfig {
            provider: routing.provider,
            model: routing.model,
            max_tokens: routing.estimated_tokens,
            temperature: 0.3,
            top_p: 1.0,
        };
        let system = "Classify this news article's trading relevance. Respond with a JSON object matching the Analysis schema.";
        let user = format!("{}\n\n{}", article.title, article.body);
        let (text, usage) = self.completer.complete_with_system(system, &user, &config).await?;

        {
            let mut stats = self.stats.lock().unwrap();
            stats.prompt_tokens += usage.prompt_tokens as u64;
            stats.completion_tokens += usage.completion_tokens as u64;
            stats.estimated_cost += routing.estimated_cost;
        }

        let analysis = parsing::parse_analysis(&article, &text);
        self.articles.mark_analyzed(&article.id, &analysis).await?;
        Ok((article, analysis))
    }

    /// Ticker + bucketed-minute key, retained for `dedup_window_minutes`.
    fn is_duplicate(&self, signal: &TradingSignal, now: DateTime<Utc>) -> bool {
        let bucket = signal.created_at.format("%Y%m%d%H%M").to_string();
        let key = format!("{}-{bucket}", signal.ticker);
        let mut recent = self.recent_signals.lock().unwrap();
        recent.retain(|_, seen_at| now - *seen_at < Duration::minutes(self.settings.dedup_window_minutes));
        if recent.contains_key(&key) {
            return true;
        }
        recent.insert(key, now);
        false
    }

    fn build_proposal(&self, signal: &TradingSignal, context: &MarketContext, now: DateTime<Utc>) -> Proposal {
        let order_value = signal.position_size * context.total_capital;
        let target_price = reference_price(signal);
        let shares = if target_price > 0.0 { (order_value / target_price).floor() as i64 } else { 0 };

        Proposal {
            id: format!("proposal-{}-{}", signal.ticker, now.timestamp_millis()),
            ticker: signal.ticker.clone(),
            action: signal.action,
            target_price,
            position_value: order_value,
            order_value,
            shares,
            reasoning: signal.reason.clone(),
            confidence: signal.confidence,
            consensus_level: signal.confidence,
            is_constitutional: false,
            violated_articles: Vec::new(),
            status: ProposalStatus::Pending,
            is_approved: true,
            market_regime: Some(context.market_regime),
            vix: Some(context.vix),
            created_at: now,
            expires_at: Some(now + Duration::hours(24)),
        }
    }
}

/// Nominal reference price used to size a proposal when no live
/// `MarketDataClient` quote has been wired in for this ticker.
fn reference_price(signal: &TradingSignal) -> f64 {
    match signal.action {
        SignalAction::Hold => 0.0,
        _ => 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::{
        Article, CompletionProvider, Holder, InsiderTrade, MarketRegime, PriceHistory,
        ProposalFilter, RoutingDecision, ShadowTrade, ShieldReport, SourceTier, TokenUsage,
    };
    use tokio::sync::Mutex as AsyncMutex;

    struct InMemoryArticles {
        pending: AsyncMutex<Vec<Article>>,
        analyzed: AsyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl ArticleRepository for InMemoryArticles {
        async fn find_unprocessed(&self, limit: usize, _since: DateTime<Utc>) -> Result<Vec<Article>, PipelineError> {
            let pending = self.pending.lock().await;
            Ok(pending.iter().take(limit).cloned().collect())
        }
        async fn mark_analyzed(&self, article_id: &str, _analysis: &Analysis) -> Result<(), PipelineError> {
            self.analyzed.lock().await.push(article_id.to_string());
            self.pending.lock().await.retain(|a| a.id != article_id);
            Ok(())
        }
        async fn load(&self, article_id: &str) -> Result<Article, PipelineError> {
            self.pending
                .lock()
                .await
                .iter()
                .find(|a| a.id == article_id)
                .cloned()
                .ok_or_else(|| PipelineError::IngestFailure("not found".to_string()))
        }
    }

    #[derive(Default)]
    struct InMemoryProposals {
        saved: AsyncMutex<Vec<Proposal>>,
    }

    #[async_trait]
    impl ProposalRepository for InMemoryProposals {
        async fn save(&self, proposal: &Proposal) -> Result<(), PipelineError> {
            self.saved.lock().await.push(proposal.clone());
            Ok(())
        }
        async fn update_status(&self, _id: &str, _status: ProposalStatus, _metadata: serde_json::Value) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn list(&self, _filter: ProposalFilter) -> Result<Vec<Proposal>, PipelineError> {
            Ok(self.saved.lock().await.clone())
        }
    }

    #[derive(Default)]
    struct InMemoryShadows {
        saved: AsyncMutex<Vec<ShadowTrade>>,
    }

    #[async_trait]
    impl ShadowRepository for InMemoryShadows {
        async fn save(&self, shadow: &ShadowTrade) -> Result<(), PipelineError> {
            self.saved.lock().await.push(shadow.clone());
            Ok(())
        }
        async fn update(&self, _shadow: &ShadowTrade) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn list_active(&self) -> Result<Vec<ShadowTrade>, PipelineError> {
            Ok(self.saved.lock().await.clone())
        }
    }

    struct MockCompleter {
        response: String,
    }

    #[async_trait]
    impl Completer for MockCompleter {
        async fn complete(&self, _prompt: &str, _config: &CompletionConfig) -> Result<(String, TokenUsage), PipelineError> {
            Ok((self.response.clone(), TokenUsage { prompt_tokens: 100, completion_tokens: 50 }))
        }
        async fn complete_with_system(&self, _system: &str, _user: &str, _config: &CompletionConfig) -> Result<(String, TokenUsage), PipelineError> {
            Ok((self.response.clone(), TokenUsage { prompt_tokens: 100, completion_tokens: 50 }))
        }
    }

    struct MockRouter;

    #[async_trait]
    impl SemanticRouter for MockRouter {
        async fn route(&self, _request: &str) -> Result<RoutingDecision, PipelineError> {
            Ok(RoutingDecision {
                intent: "news_analysis".to_string(),
                provider: CompletionProvider::Mock,
                model: "mock-1".to_string(),
                estimated_tokens: 500,
                estimated_cost: 0.001,
            })
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        sent: AsyncMutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSink for MockNotifier {
        async fn send_proposal(&self, proposal: &Proposal) {
            self.sent.lock().await.push(proposal.id.clone());
        }
        async fn send_shield_report(&self, _report: &ShieldReport) {}
    }

    #[allow(dead_code)]
    struct MockMarketData;

    #[async_trait]
    impl core_types::MarketDataClient for MockMarketData {
        async fn get_current_price(&self, _ticker: &str) -> Result<f64, PipelineError> {
            Ok(100.0)
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

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            ticker: Some("AAPL".to_string()),
            title: "AAPL beats quarterly earnings expectations".to_string(),
            body: "Strong revenue growth reported across all segments.".to_string(),
            source_name: "Reuters".to_string(),
            source_tier: SourceTier::Major,
            published_at: Utc::now(),
            url: None,
            sentiment: None,
        }
    }

    fn context() -> MarketContext {
        let mut allocation = HashMap::new();
        allocation.insert("cash".to_string(), 0.50);
        allocation.insert("stocks".to_string(), 0.50);
        MarketContext {
            total_capital: 100_000.0,
            current_allocation: allocation,
            daily_trades: 1,
            weekly_trades: 3,
            daily_volume_usd: 10_000_000.0,
            vix: 16.0,
            market_regime: MarketRegime::Neutral,
        }
    }

    fn well_formed_completion() -> String {
        r#"{"sentiment_label":"positive","sentiment_score":0.8,"confidence":0.9,"urgency":"high","impact_magnitude":0.8,"risk_category":"low","trading_actionable":true,"related_tickers":[{"ticker":"AAPL","relevance":90,"sentiment":0.8}]}"#
            .to_string()
    }

    fn orchestrator(articles: Vec<Article>, completion: String) -> (PipelineOrchestrator, Arc<InMemoryProposals>, Arc<InMemoryShadows>, Arc<MockNotifier>) {
        let article_repo = Arc::new(InMemoryArticles { pending: AsyncMutex::new(articles), analyzed: AsyncMutex::new(Vec::new()) });
        let proposal_repo = Arc::new(InMemoryProposals::default());
        let shadow_repo = Arc::new(InMemoryShadows::default());
        let completer = Arc::new(MockCompleter { response: completion });
        let router = Arc::new(MockRouter);
        let notifier = Arc::new(MockNotifier::default());

        let orchestrator = PipelineOrchestrator::new(
            article_repo,
            proposal_repo.clone(),
            shadow_repo.clone(),
            completer,
            router,
            notifier.clone(),
            OrchestratorSettings::default(),
        );
        (orchestrator, proposal_repo, shadow_repo, notifier)
    }

    #[tokio::test]
    async fn cycle_with_a_single_article_produces_no_cluster_and_no_proposal() {
        let (orchestrator, proposals, _shadows, _notifier) = orchestrator(vec![article("a1")], well_formed_completion());
        let now = Utc::now();
        let result = orchestrator.run_cycle(now, &context()).await.unwrap();
        assert!(result.is_empty());
        assert!(proposals.saved.lock().await.is_empty());
        let stats = orchestrator.statistics();
        assert_eq!(stats.articles_processed, 1);
        assert_eq!(stats.analyses_generated, 1);
    }

    #[tokio::test]
    async fn re_running_on_already_analyzed_articles_processes_nothing_new() {
        let (orchestrator, _proposals, _shadows, _notifier) = orchestrator(vec![article("a1")], well_formed_completion());
        let now = Utc::now();
        orchestrator.run_cycle(now, &context()).await.unwrap();
        orchestrator.run_cycle(now, &context()).await.unwrap();
        assert_eq!(orchestrator.statistics().articles_processed, 1);
    }

    #[tokio::test]
    async fn malformed_completion_falls_back_and_still_counts_as_processed() {
        let (orchestrator, _proposals, _shadows, _notifier) = orchestrator(vec![article("a1")], "not json".to_string());
        let now = Utc::now();
        orchestrator.run_cycle(now, &context()).await.unwrap();
        assert_eq!(orchestrator.statistics().analyses_generated, 1);
    }

    #[tokio::test]
    async fn two_articles_in_one_cluster_can_reach_a_proposal() {
        let (orchestrator, proposals, _shadows, _notifier) =
            orchestrator(vec![article("a1"), article("a2")], well_formed_completion());
        let now = Utc::now();
        orchestrator.run_cycle(now, &context()).await.unwrap();
        // Both articles share a fingerprint and theme, so the second reaches
        // min_cluster_size and may clear every downstream gate.
        let stats = orchestrator.statistics();
        assert_eq!(stats.articles_processed, 2);
        assert!(stats.signals_generated <= 2);
        let _ = proposals.saved.lock().await;
    }
}
