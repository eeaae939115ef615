// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "audit/json_audit_store.rs"]
pub mod audit;

#[path = "blacklist/json_blacklist_store.rs"]
pub mod blacklist;

#[path = "rules/json_rule_store.rs"]
pub mod rules;
