pub mod api;
pub mod clock;
pub mod completion;
pub mod db;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod server;
pub mod session;
pub mod streak;
