use chrono::Duration;

use crate::models::Appointment;
use crate::services::hours::SLOT_MINUTES;

pub fn generate_ics(appt: &Appointment, service_label: &str) -> String {
    let dtstart = appt.scheduled_at.format("%Y%m%dT%H%M%S").to_string();
    let dtend = (appt.scheduled_at + Duration::minutes(SLOT_MINUTES as i64))
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtstamp = appt.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@salonbook", appt.id);

    let summary = format!("Salon appointment: {service_label}");
    let description = appt.notes.as_deref().unwrap_or("No additional notes");

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::NaiveDateTime;

    #[test]
    fn ics_covers_one_slot() {
        let scheduled =
            NaiveDateTime::parse_from_str("2025-06-17 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let appt = Appointment {
            id: "appt-1".to_string(),
            user_id: "u1".to_string(),
            service_id: "svc-m-cut".to_string(),
            scheduled_at: scheduled,
            status: AppointmentStatus::Scheduled,
            notes: Some("first visit".to_string()),
            walk_in_name: None,
            walk_in_phone: None,
            staff_name: None,
            reminder_sent: false,
            created_at: scheduled,
            updated_at: scheduled,
        };

        let ics = generate_ics(&appt, "male cut");
        assert!(ics.contains("UID:appt-1@salonbook"));
        assert!(ics.contains("DTSTART:20250617T100000"));
        assert!(ics.contains("DTEND:20250617T103000"));
        assert!(ics.contains("SUMMARY:Salon appointment: male cut"));
        assert!(ics.contains("DESCRIPTION:first visit"));
    }
}
