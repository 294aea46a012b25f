//! Email dispatch for HIGH stock alerts
//!
//! Each HIGH alert goes to every administrator as its own message. A failed
//! send is logged and counted; the remaining sends still happen and nothing
//! is retried within the cycle.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{AdministratorContact, RiskTier, StockAlert, LOW_STOCK_THRESHOLD};

use crate::external::{EmailMessage, Mailer};

/// Outcome of one dispatch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Sends alert emails to administrators
#[derive(Clone)]
pub struct AlertDispatcher {
    mailer: Option<Arc<dyn Mailer>>,
}

impl AlertDispatcher {
    /// Create a new AlertDispatcher; `None` disables delivery
    pub fn new(mailer: Option<Arc<dyn Mailer>>) -> Self {
        Self { mailer }
    }

    /// Send one email per administrator for every HIGH alert
    pub async fn dispatch(
        &self,
        alerts: &[StockAlert],
        admins: &[AdministratorContact],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let high: Vec<&StockAlert> = alerts
            .iter()
            .filter(|a| a.risk_tier == RiskTier::High)
            .collect();
        if high.is_empty() || admins.is_empty() {
            return report;
        }

        let Some(mailer) = self.mailer.as_ref() else {
            tracing::warn!(
                alerts = high.len(),
                admins = admins.len(),
                "Mail is not configured, skipping stock alert emails"
            );
            return report;
        };

        for alert in high {
            for admin in admins {
                report.attempted += 1;
                let message = alert_email(alert, &admin.email);
                match mailer.send(&message).await {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            error = %e,
                            recipient = %admin.email,
                            product = %alert.product_name,
                            "Stock alert email failed"
                        );
                    }
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "Stock alert dispatch finished"
        );
        report
    }
}

/// Headline and requested action for a HIGH alert, by remaining quantity
fn alert_wording(alert: &StockAlert) -> (&'static str, String, String) {
    let days = alert.days_until_stockout.unwrap_or(0);
    match alert.current_quantity {
        0 => (
            "CRITICAL ALERT: OUT OF STOCK",
            format!(
                "Product {} of company {} is OUT OF STOCK.",
                alert.product_name, alert.company_name
            ),
            "URGENT restock required immediately.".to_string(),
        ),
        1..=3 => (
            "CRITICAL ALERT: CRITICAL STOCK",
            format!(
                "Product {} of company {} has CRITICAL stock ({} units).",
                alert.product_name, alert.company_name, alert.current_quantity
            ),
            format!(
                "Stockout imminent in {} day(s). Urgent restock required.",
                days
            ),
        ),
        q if q <= LOW_STOCK_THRESHOLD => (
            "ALERT: VERY LOW STOCK",
            format!(
                "Product {} of company {} has VERY LOW stock ({} units).",
                alert.product_name, alert.company_name, alert.current_quantity
            ),
            format!(
                "Stockout expected in about {} days. Restock soon.",
                days
            ),
        ),
        // raised by the prediction, not by the stock level
        _ => (
            "ALERT: PREDICTED STOCKOUT",
            format!(
                "Product {} of company {} is predicted to run out in {} days ({} units left).",
                alert.product_name, alert.company_name, days, alert.current_quantity
            ),
            "Review demand and plan a restock.".to_string(),
        ),
    }
}

/// Build the email for one alert and recipient
pub fn alert_email(alert: &StockAlert, recipient: &str) -> EmailMessage {
    let (headline, summary, action) = alert_wording(alert);
    let days = alert
        .days_until_stockout
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let sent_at = Utc::now().format("%d/%m/%Y %H:%M:%S");

    let text_body = format!(
        "{headline}\n\n{summary}\n\n\
         Alert details:\n\
         - Product: {product}\n\
         - Company: {company}\n\
         - Current quantity: {quantity} units\n\
         - Days until stockout: {days}\n\
         - Risk tier: {tier}\n\n\
         Required action:\n{action}\n\n\
         This is an automated message from the inventory management system.\n\
         Date: {sent_at}\n",
        product = alert.product_name,
        company = alert.company_name,
        quantity = alert.current_quantity,
        tier = alert.risk_tier,
    );

    let box_class = if alert.current_quantity <= 3 { "critical" } else { "warning" };
    let html_body = format!(
        "<html><body>\
         <h2>{headline}</h2>\
         <p>{summary}</p>\
         <div class=\"{box_class}\"><h3>Alert details</h3><ul>\
         <li><strong>Product:</strong> {product}</li>\
         <li><strong>Company:</strong> {company}</li>\
         <li><strong>Current quantity:</strong> {quantity} units</li>\
         <li><strong>Days until stockout:</strong> {days}</li>\
         <li><strong>Risk tier:</strong> {tier}</li>\
         </ul></div>\
         <h3>Required action</h3><p>{action}</p>\
         <p><small>Automated message from the inventory management system. Date: {sent_at}</small></p>\
         </body></html>",
        product = html_escape(&alert.product_name),
        company = html_escape(&alert.company_name),
        summary = html_escape(&summary),
        quantity = alert.current_quantity,
        tier = alert.risk_tier,
    );

    EmailMessage {
        to: recipient.to_string(),
        subject: format!(
            "{} - {} ({})",
            headline, alert.product_name, alert.company_name
        ),
        text_body,
        html_body: Some(html_body),
        attachments: Vec::new(),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::external::MailError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every message; fails for one chosen recipient
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail_for: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
            if self.fail_for.as_deref() == Some(message.to.as_str()) {
                return Err(MailError::Rejected {
                    status: 550,
                    message: "mailbox unavailable".into(),
                });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn alert(product: &str, quantity: u32, tier: RiskTier) -> StockAlert {
        StockAlert {
            product_name: product.into(),
            company_name: "Acme SAS".into(),
            current_quantity: quantity,
            days_until_stockout: Some(1),
            message: String::new(),
            risk_tier: tier,
        }
    }

    fn admins(n: usize) -> Vec<AdministratorContact> {
        (0..n)
            .map(|i| AdministratorContact {
                email: format!("admin{}@example.com", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn one_email_per_admin_per_high_alert() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = AlertDispatcher::new(Some(mailer.clone()));
        let alerts = vec![
            alert("Laptop", 0, RiskTier::High),
            alert("Mouse", 2, RiskTier::High),
            alert("Cable", 8, RiskTier::Medium),
        ];

        let report = dispatcher.dispatch(&alerts, &admins(3)).await;

        assert_eq!(
            report,
            DispatchReport {
                attempted: 6,
                delivered: 6,
                failed: 0
            }
        );
        assert_eq!(mailer.sent.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn failed_recipient_does_not_stop_others() {
        let mailer = Arc::new(RecordingMailer {
            fail_for: Some("admin1@example.com".into()),
            ..Default::default()
        });
        let dispatcher = AlertDispatcher::new(Some(mailer.clone()));

        let report = dispatcher
            .dispatch(&[alert("Laptop", 0, RiskTier::High)], &admins(3))
            .await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn without_mailer_nothing_is_attempted() {
        let dispatcher = AlertDispatcher::new(None);
        let report = dispatcher
            .dispatch(&[alert("Laptop", 0, RiskTier::High)], &admins(2))
            .await;
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn subject_reflects_quantity() {
        let out = alert_email(&alert("Laptop", 0, RiskTier::High), "a@example.com");
        assert!(out.subject.starts_with("CRITICAL ALERT: OUT OF STOCK"));

        let critical = alert_email(&alert("Laptop", 3, RiskTier::High), "a@example.com");
        assert!(critical.subject.starts_with("CRITICAL ALERT: CRITICAL STOCK"));

        let low = alert_email(&alert("Laptop", 5, RiskTier::High), "a@example.com");
        assert_eq!(low.subject, "ALERT: VERY LOW STOCK - Laptop (Acme SAS)");
        assert!(low.text_body.contains("Current quantity: 5 units"));
    }

    #[test]
    fn predicted_alert_on_healthy_stock_is_not_called_low() {
        let mut predicted = alert("Laptop", 30, RiskTier::High);
        predicted.days_until_stockout = Some(4);
        let out = alert_email(&predicted, "a@example.com");
        assert_eq!(out.subject, "ALERT: PREDICTED STOCKOUT - Laptop (Acme SAS)");
        assert!(out.text_body.contains("predicted to run out in 4 days (30 units left)"));
        assert!(!out.text_body.contains("VERY LOW"));
    }

    #[test]
    fn html_body_escapes_names() {
        let out = alert_email(&alert("<b>Laptop</b>", 0, RiskTier::High), "a@example.com");
        let html = out.html_body.unwrap();
        assert!(html.contains("&lt;b&gt;Laptop&lt;/b&gt;"));
        assert!(!html.contains("<b>Laptop</b>"));
    }
}
