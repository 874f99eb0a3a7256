// Shared foundation for the draft league summary pipeline: configuration
// loading and the typed league data model.

pub mod config;
pub mod league;
