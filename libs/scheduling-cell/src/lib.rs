pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    AppointmentStatus, AvailabilityStats, BookingDraft, DayAvailability, DraftStage,
    Rendezvous, StatusBadge, TimeSlot,
};
pub use services::SchedulingState;
