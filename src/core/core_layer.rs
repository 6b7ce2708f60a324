// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "knowledge/mod.rs"]
pub mod knowledge;
