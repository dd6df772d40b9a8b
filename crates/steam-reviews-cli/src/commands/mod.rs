pub mod config;
pub mod fetch;
pub mod fetch_ui;
pub mod prompts;
pub mod search;
