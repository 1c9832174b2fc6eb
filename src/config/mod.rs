// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] defines the TOML-backed settings structures.
//! - [`loader`] reads and deserializes a settings file.
//! - [`validate`] turns a [`model::RawSettings`] into a validated
//!   [`model::Settings`].

pub mod loader;
pub mod model;
pub mod validate;

pub use model::{
    DiscoverySection, NotificationSettings, OutputSection, RawSettings, Settings, ToolSection,
};
