pub mod appointment;
pub mod service;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use service::{Clientele, Service, ServiceFlags};
pub use user::{Role, User};
