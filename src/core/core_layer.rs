// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "blacklist/blacklist_service.rs"]
pub mod blacklist;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "rules/mod.rs"]
pub mod rules;

#[path = "tracker/tracker_service.rs"]
pub mod tracker;
