mod config;
mod notification;

pub use config::{Config, ConfigValidationError, FlashSettings, LoadConfigError};
pub use notification::{FlashArgs, Notification, Redirect};
