//! Populates the App Store listing of one app version: description, keywords,
//! subtitle, privacy policy URL and primary category.
//!
//! [Doc](https://developer.apple.com/documentation/appstoreconnectapi/app_metadata)

pub use apple_app_store_connect_api_client;

pub mod config;
pub mod content;
pub mod models;
pub mod setup;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError};
pub use content::MetadataContent;
pub use setup::{run, Creation, Report, SetupError};
