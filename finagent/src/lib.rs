pub mod configuration;
pub mod manager;
pub mod mcp;
pub mod reports;
pub mod server;
pub mod smoke;

pub use configuration::Settings;
pub use manager::{OpenAiManager, ResearchManager};
pub use mcp::McpSseClient;
pub use server::run_server;

use dotenv::dotenv;

pub fn init() {
    dotenv().ok();
}
