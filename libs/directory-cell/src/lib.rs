pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{DashboardStats, Dentiste, Patient};
pub use services::DirectoryState;
