// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "knowledge/mod.rs"]
pub mod knowledge;
