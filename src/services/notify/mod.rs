pub mod mailer;

use async_trait::async_trait;

/// What a notification needs to say about an appointment.
#[derive(Debug, Clone)]
pub struct AppointmentSummary {
    pub when: String,
    pub service: String,
    pub notes: Option<String>,
}

impl AppointmentSummary {
    pub fn confirmation_text(&self) -> String {
        match &self.notes {
            Some(notes) => format!(
                "Your appointment ({}) is booked for {}. Notes: {notes}",
                self.service, self.when
            ),
            None => format!(
                "Your appointment ({}) is booked for {}.",
                self.service, self.when
            ),
        }
    }

    pub fn reminder_text(&self) -> String {
        format!(
            "Reminder: your appointment ({}) is today, {}.",
            self.service, self.when
        )
    }
}

/// Outbound mail boundary. Errors are the caller's to log and swallow; a
/// failed send never fails a booking or a reminder run.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send_booking_confirmation(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()>;

    async fn send_appointment_reminder(
        &self,
        to: &str,
        summary: &AppointmentSummary,
    ) -> anyhow::Result<()>;
}
