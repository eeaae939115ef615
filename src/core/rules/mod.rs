// Core rules module - per-guild moderation configuration and its store.
// Following the same pattern as the moderation module.

pub mod rule_models;
pub mod rule_store;

pub use rule_models::*;
pub use rule_store::*;
