// Caption generation: prompt templates and the Claude Messages API client.

pub mod client;
pub mod prompt;
