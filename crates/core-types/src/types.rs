use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Credibility tier assigned to a news source by the Source Classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTier {
    Major,
    Minor,
    Social,
    Unknown,
}

impl SourceTier {
    /// Weight used by the Four-Signal Calculator's diversity-integrity score.
    pub fn weight(&self) -> f64 {
        match self {
            SourceTier::Major => 2.0,
            SourceTier::Minor => 0.5,
            SourceTier::Social => 0.1,
            SourceTier::Unknown => 0.3,
        }
    }
}

/// Deterministic `(source_name, url?) -> SourceInfo` classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub tier: SourceTier,
    pub credibility: f64,
    pub country: Option<String>,
    pub category: Option<String>,
}

/// Immutable news article. Created by the ingestion collaborator, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub ticker: Option<String>,
    pub title: String,
    pub body: String,
    pub source_name: String,
    pub source_tier: SourceTier,
    pub published_at: DateTime<Utc>,
    pub url: Option<String>,
    /// Pre-existing sentiment in [-1, 1], if the ingestion pipeline already scored it.
    pub sentiment: Option<f64>,
}

/// Outcome of an Event Calendar lookup: whether the timestamp fell inside a known
/// scheduled event window, and if so, with what confidence and under what name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLegitimacy {
    pub matched: bool,
    pub confidence: f64,
    pub event_name: Option<String>,
}

/// The label the Verdict Classifier attaches to a Cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    EmbargoEvent,
    OrganicConsensus,
    ManipulationAttack,
    SuspiciousBurst,
    ViralTrend,
    Pending,
}

impl Default for Verdict {
    fn default() -> Self {
        Verdict::Pending
    }
}

/// A time-bounded set of Articles sharing a content fingerprint. Mutable: grows as
/// matching Articles arrive, re-scored on every addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub fingerprint: String,
    pub ticker: String,
    pub theme: String,
    pub articles: Vec<Article>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub di: f64,
    pub tn: f64,
    pub ni: f64,
    pub el: EventLegitimacy,
    pub verdict: Verdict,
    pub verdict_reason: String,
    pub confidence_multiplier: f64,
    pub cooling_intensity: f64,
    pub cooling_until: Option<DateTime<Utc>>,
}

impl Cluster {
    pub fn is_cooling(&self, now: DateTime<Utc>) -> bool {
        self.cooling_until.map(|until| now < until).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Immediate,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

/// A related ticker extracted from an Article, with how relevant it is and its
/// per-ticker sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedTicker {
    pub ticker: String,
    pub relevance: f64,
    pub sentiment: f64,
}

/// Derived record per Article: the output of the Completer + the Clustering Engine's
/// verdict-adjustment step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub article_id: String,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
    pub confidence: f64,
    pub urgency: Urgency,
    pub impact_magnitude: f64,
    pub risk_category: RiskCategory,
    pub trading_actionable: bool,
    pub related_tickers: Vec<RelatedTicker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub ticker: String,
    pub action: SignalAction,
    pub position_size: f64,
    pub confidence: f64,
    pub execution_type: ExecutionType,
    pub reason: String,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    pub source_article_id: Option<String>,
    pub affected_sectors: Vec<String>,
    pub auto_execute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    RiskOn,
    Neutral,
    RiskOff,
}

/// A candidate trade awaiting human approval. Only `Pending` proposals may transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub ticker: String,
    pub action: SignalAction,
    pub target_price: f64,
    pub position_value: f64,
    pub order_value: f64,
    pub shares: i64,
    pub reasoning: String,
    pub confidence: f64,
    pub consensus_level: f64,
    pub is_constitutional: bool,
    pub violated_articles: Vec<String>,
    pub status: ProposalStatus,
    pub is_approved: bool,
    pub market_regime: Option<MarketRegime>,
    pub vix: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn can_transition(&self) -> bool {
        self.status == ProposalStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowStatus {
    Tracking,
    Closed,
    Expired,
}

/// A hypothetical position representing a rejected or HOLD-ed Proposal, tracked to
/// quantify defensive value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowTrade {
    pub id: String,
    pub proposal_id: Option<String>,
    pub ticker: String,
    pub action: SignalAction,
    pub entry_price: f64,
    pub entry_date: DateTime<Utc>,
    pub exit_price: Option<f64>,
    pub shares: i64,
    pub rejection_reason: String,
    pub violated_articles: Vec<String>,
    pub tracking_days: i64,
    pub status: ShadowStatus,
    pub virtual_pnl: f64,
    pub virtual_pnl_pct: f64,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Per-cycle, read-only market snapshot handed to the Constitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub total_capital: f64,
    pub current_allocation: HashMap<String, f64>,
    pub daily_trades: i64,
    pub weekly_trades: i64,
    pub daily_volume_usd: f64,
    pub vix: f64,
    pub market_regime: MarketRegime,
}

/// Summary of rejected Proposals and the loss they hypothetically avoided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldReport {
    pub period_days: i64,
    pub rejected: i64,
    pub defensive_wins: i64,
    pub defensive_win_rate: f64,
    pub total_avoided_loss: f64,
    pub highlights: Vec<ShieldHighlight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldHighlight {
    pub ticker: String,
    pub action: SignalAction,
    pub rejection_reason: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub avoided_loss: f64,
    pub pnl_pct: f64,
    pub date: DateTime<Utc>,
}

/// LLM provider identity. The core depends on none of them concretely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    Openai,
    Anthropic,
    Gemini,
    Mock,
    Glm,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub provider: CompletionProvider,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub intent: String,
    pub provider: CompletionProvider,
    pub model: String,
    pub estimated_tokens: u32,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub dates: Vec<DateTime<Utc>>,
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    pub shares: i64,
    pub value_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub insider_name: String,
    pub action: SignalAction,
    pub shares: i64,
    pub price: f64,
    pub filed_at: DateTime<Utc>,
}
