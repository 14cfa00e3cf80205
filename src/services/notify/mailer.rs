use anyhow::Context;
use async_trait::async_trait;

use super::{AppointmentSummary, NotificationProvider};

/// HTTP mail-gateway client (Mailgun-style messages endpoint).
pub struct MailApiProvider {
    api_url: String,
    api_key: String,
    from_address: String,
    client: reqwest::Client,
}

impl MailApiProvider {
    pub fn new(api_url: String, api_key: String, from_address: String) -> Self {
        Self {
            api_url,
            api_key,
            from_address,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from_address,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .context("failed to reach mail gateway")?
            .error_for_status()
            .context("mail gateway returned error")?;

        Ok(())
    }
}

#[async_trait]
impl NotificationProvider for MailApiProvider {
    async fn send_booking_confirmation(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()> {
        self.send(to, "Appointment confirmed", &summary.confirmation_text())
            .await
    }

    async fn send_appointment_reminder(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()> {
        self.send(to, "Appointment reminder", &summary.reminder_text())
            .await
    }
}
