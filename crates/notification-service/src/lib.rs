//! Notification Sink (the outbound half of component J's step 8).
//!
//! Dispatches Proposals and ShieldReports to whatever channels are configured
//! (SMTP, Discord webhook) with a human-readable Korean message citing every
//! violated Article, so a rejection is legible without opening a dashboard.

mod smtp;
mod templates;

pub use smtp::SmtpNotifier;
pub use templates::EmailTemplate;

use async_trait::async_trait;
use core_types::{Proposal, ProposalStatus, ShieldReport, SignalAction};
use serde::{Deserialize, Serialize};

/// What triggered this notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertType {
    ProposalDecision {
        ticker: String,
        action: SignalAction,
        status: ProposalStatus,
        confidence: f64,
        violated_articles: Vec<String>,
    },
    ShieldReport {
        period_days: i64,
        rejected: i64,
        defensive_wins: i64,
        defensive_win_rate: f64,
        total_avoided_loss: f64,
    },
}

/// A notification alert to be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(alert_type: AlertType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { alert_type, timestamp: chrono::Utc::now(), title: title.into(), message: message.into() }
    }
}

/// A transport the service can dispatch an `Alert` through.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Discord webhook error: {0}")]
    Discord(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Vec<String>,
    pub smtp_tls: SmtpTls,
    pub discord_webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub enum SmtpTls {
    #[default]
    StartTls,
    Tls,
    None,
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        let smtp_to = std::env::var("NOTIFICATION_EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let smtp_tls = match std::env::var("SMTP_TLS").unwrap_or_default().as_str() {
            "tls" => SmtpTls::Tls,
            "none" => SmtpTls::None,
            _ => SmtpTls::StartTls,
        };

        Self {
            smtp_host: std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
            smtp_port: std::env::var("SMTP_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok().filter(|s| !s.is_empty()),
            smtp_password: std::env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_from: std::env::var("SMTP_FROM_ADDRESS").ok().filter(|s| !s.is_empty()),
            smtp_to,
            smtp_tls,
            discord_webhook_url: std::env::var("DISCORD_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
        }
    }
}

/// Dispatches alerts to every configured channel and implements
/// `core_types::NotificationSink` over Proposals and ShieldReports.
pub struct NotificationService {
    channels: std::sync::Arc<Vec<Box<dyn NotificationChannel>>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.smtp_host.is_some() && config.smtp_from.is_some() && !config.smtp_to.is_empty() {
            match SmtpNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!("email notifications enabled (SMTP -> {} recipients)", config.smtp_to.len());
                    channels.push(Box::new(notifier));
                }
                Err(e) => tracing::warn!("failed to initialize SMTP notifier: {e}"),
            }
        }

        if let Some(ref webhook_url) = config.discord_webhook_url {
            channels.push(Box::new(DiscordWebhookNotifier { webhook_url: webhook_url.clone(), client: reqwest::Client::new() }));
            tracing::info!("Discord webhook notifications enabled");
        }

        if channels.is_empty() {
            tracing::info!("no notification channels configured (set SMTP_HOST or DISCORD_WEBHOOK_URL)");
        }

        Self { channels: std::sync::Arc::new(channels) }
    }

    pub async fn send_alert_async(&self, alert: &Alert) {
        for channel in self.channels.iter() {
            match channel.send(alert).await {
                Ok(()) => tracing::debug!("sent notification via {}", channel.name()),
                Err(e) => tracing::warn!("failed to send notification via {}: {e}", channel.name()),
            }
        }
    }
}

#[async_trait]
impl core_types::NotificationSink for NotificationService {
    async fn send_proposal(&self, proposal: &Proposal) {
        let title = format!("{:?} {} — {:?}", proposal.action, proposal.ticker, proposal.status);
        let message = build_proposal_message(proposal);
        let alert = Alert::new(
            AlertType::ProposalDecision {
                ticker: proposal.ticker.clone(),
                action: proposal.action,
                status: proposal.status,
                confidence: proposal.confidence,
                violated_articles: proposal.violated_articles.clone(),
            },
            title,
            message,
        );
        self.send_alert_async(&alert).await;
    }

    async fn send_shield_report(&self, report: &ShieldReport) {
        let title = format!("방어막 보고서 — 최근 {}일", report.period_days);
        let message = build_shield_report_message(report);
        let alert = Alert::new(
            AlertType::ShieldReport {
                period_days: report.period_days,
                rejected: report.rejected,
                defensive_wins: report.defensive_wins,
                defensive_win_rate: report.defensive_win_rate,
                total_avoided_loss: report.total_avoided_loss,
            },
            title,
            message,
        );
        self.send_alert_async(&alert).await;
    }
}

/// Human-readable Korean summary citing every violated Article, per §7's
/// user-visible failure behaviour ("VIX 25 초과, 방어 모드" plus rule ids).
fn build_proposal_message(proposal: &Proposal) -> String {
    let mut lines = vec![format!(
        "{} {:?} 제안, 신뢰도 {:.0}%, 상태 {:?}",
        proposal.ticker,
        proposal.action,
        proposal.confidence * 100.0,
        proposal.status
    )];
    if let Some(vix) = proposal.vix {
        if vix >= 25.0 {
            lines.push(format!("VIX {vix:.0} 초과, 방어 모드"));
        }
    }
    if !proposal.violated_articles.is_empty() {
        lines.push(format!("위반 조항: {}", proposal.violated_articles.join(", ")));
    }
    lines.push(proposal.reasoning.clone());
    lines.join("\n")
}

fn build_shield_report_message(report: &ShieldReport) -> String {
    format!(
        "기각 {} 건, 방어적 성공 {} 건 ({:.0}%), 회피 손실 합계 ${:.2}",
        report.rejected,
        report.defensive_wins,
        report.defensive_win_rate * 100.0,
        report.total_avoided_loss
    )
}

struct DiscordWebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

#[async_trait]
impl NotificationChannel for DiscordWebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let color = match &alert.alert_type {
            AlertType::ProposalDecision { status, .. } => match status {
                ProposalStatus::Approved | ProposalStatus::Executed => 0x00ff00,
                ProposalStatus::Rejected => 0xff0000,
                ProposalStatus::Pending => 0x0099ff,
                ProposalStatus::Expired => 0x94a3b8,
            },
            AlertType::ShieldReport { total_avoided_loss, .. } => {
                if *total_avoided_loss > 0.0 {
                    0x22c55e
                } else {
                    0x64748b
                }
            }
        };

        let payload = serde_json::json!({
            "embeds": [{
                "title": alert.title,
                "description": alert.message,
                "color": color,
                "timestamp": alert.timestamp.to_rfc3339(),
            }]
        });

        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Discord(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "discord-webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::MarketRegime;

    fn base_proposal() -> Proposal {
        Proposal {
            id: "p1".to_string(),
            ticker: "TSLA".to_string(),
            action: SignalAction::Buy,
            target_price: 250.0,
            position_value: 25_000.0,
            order_value: 25_000.0,
            shares: 100,
            reasoning: "Bullish earnings beat".to_string(),
            confidence: 0.8,
            consensus_level: 0.7,
            is_constitutional: false,
            violated_articles: vec!["제1조 (자본 보존 우선)".to_string()],
            status: ProposalStatus::Rejected,
            is_approved: false,
            market_regime: Some(MarketRegime::RiskOn),
            vix: Some(26.0),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn proposal_message_cites_vix_and_articles() {
        let message = build_proposal_message(&base_proposal());
        assert!(message.contains("VIX 26 초과, 방어 모드"));
        assert!(message.contains("제1조 (자본 보존 우선)"));
    }

    #[test]
    fn shield_report_message_formats_percentages() {
        let report = ShieldReport {
            period_days: 30,
            rejected: 10,
            defensive_wins: 7,
            defensive_win_rate: 0.7,
            total_avoided_loss: 4200.0,
            highlights: Vec::new(),
        };
        let message = build_shield_report_message(&report);
        assert!(message.contains("70%"));
        assert!(message.contains("4200.00"));
    }
}
