pub mod booking;
pub mod calendar;
pub mod hours;
pub mod matcher;
pub mod notify;
pub mod reminders;
pub mod slots;
