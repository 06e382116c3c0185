//! Configuration loading for the dataset generator.
//!
//! Loads all settings from a single TOML file. Every section and field is
//! optional; missing values take the defaults in [`defaults`].

mod dataset;
mod defaults;
mod error;
mod sections;

pub use dataset::DatasetConfig;
pub use error::ConfigLoadError;
pub use sections::{
    InputSection, LoopMarker, OutputSection, RegistrationMethod, RegistrationSection,
    ReviewSection,
};
