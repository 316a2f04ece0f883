use crate::{Alert, AlertType};
use core_types::{ProposalStatus, SignalAction};

pub struct EmailTemplate;

impl EmailTemplate {
    pub fn render(alert: &Alert) -> String {
        let body_content = match &alert.alert_type {
            AlertType::ProposalDecision { ticker, action, status, confidence, violated_articles } => {
                let action_color = match action {
                    SignalAction::Buy => "#22c55e",
                    SignalAction::Sell => "#ef4444",
                    SignalAction::Hold => "#64748b",
                };
                let status_label = match status {
                    ProposalStatus::Pending => "대기 중",
                    ProposalStatus::Approved => "승인됨",
                    ProposalStatus::Rejected => "기각됨",
                    ProposalStatus::Executed => "실행됨",
                    ProposalStatus::Expired => "만료됨",
                };
                let articles_html = if violated_articles.is_empty() {
                    String::new()
                } else {
                    format!(
                        r#"<tr style="background:#fef2f2;"><td style="padding:8px 12px;color:#94a3b8;">위반 조항</td><td style="padding:8px 12px;font-weight:600;color:#ef4444;">{}</td></tr>"#,
                        violated_articles.join(", ")
                    )
                };
                format!(
                    r#"<div style="background:{action_color};color:#fff;padding:12px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:700;">{ticker} &mdash; {status_label}</div>
<table style="width:100%;border-collapse:collapse;">
  <tr><td style="padding:8px 12px;color:#94a3b8;">종목</td><td style="padding:8px 12px;font-weight:600;">{ticker}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">신뢰도</td><td style="padding:8px 12px;font-weight:600;">{:.0}%</td></tr>
  {articles_html}
</table>"#,
                    confidence * 100.0
                )
            }
            AlertType::ShieldReport { period_days, rejected, defensive_wins, defensive_win_rate, total_avoided_loss } => {
                format!(
                    r#"<div style="background:#1e293b;color:#fff;padding:12px 20px;border-radius:8px 8px 0 0;font-size:18px;font-weight:700;">방어막 보고서 &mdash; 최근 {period_days}일</div>
<table style="width:100%;border-collapse:collapse;">
  <tr><td style="padding:8px 12px;color:#94a3b8;">기각된 제안</td><td style="padding:8px 12px;font-weight:600;">{rejected}</td></tr>
  <tr style="background:#f8fafc;"><td style="padding:8px 12px;color:#94a3b8;">방어적 성공</td><td style="padding:8px 12px;font-weight:600;">{defensive_wins} ({:.0}%)</td></tr>
  <tr><td style="padding:8px 12px;color:#94a3b8;">회피 손실 합계</td><td style="padding:8px 12px;font-weight:600;color:#22c55e;">${total_avoided_loss:.2}</td></tr>
</table>"#,
                    defensive_win_rate * 100.0
                )
            }
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1"></head>
<body style="margin:0;padding:0;background:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;">
<table width="100%" cellpadding="0" cellspacing="0" style="background:#f1f5f9;padding:32px 0;">
  <tr><td align="center">
    <table width="600" cellpadding="0" cellspacing="0" style="background:#ffffff;border-radius:8px;overflow:hidden;box-shadow:0 1px 3px rgba(0,0,0,0.1);">
      <tr><td>
        {body_content}
      </td></tr>
      <tr><td style="padding:16px 20px;border-top:1px solid #e2e8f0;">
        <p style="margin:0;color:#94a3b8;font-size:12px;">
          {msg}
          <br>Sent at {ts} UTC
        </p>
      </td></tr>
    </table>
  </td></tr>
</table>
</body>
</html>"#,
            msg = alert.message.replace('<', "&lt;").replace('>', "&gt;"),
            ts = alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}
