pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod providers;
pub mod reminders;
pub mod scheduler;
pub mod services;

pub type Result<T> = std::result::Result<T, error::SelfCareError>;

pub use crate::config::Config;
pub use crate::error::SelfCareError;
pub use crate::reminders::{Reminder, ReminderStore};
