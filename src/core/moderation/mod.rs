// Core moderation module - decision engine and action dispatcher.

pub mod decision_engine;
pub mod dispatcher;
pub mod moderation_models;

pub use decision_engine::*;
pub use dispatcher::*;
pub use moderation_models::*;
