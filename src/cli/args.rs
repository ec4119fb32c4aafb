use clap::Parser;

use crate::core::Provider;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable tool usage
    #[arg(long)]
    pub enable_tools: Option<bool>,

    /// Maximum number of model calls per question
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Seconds to wait for an answer before giving up
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Your query to the LLM; omit it to start an interactive chat
    #[arg()]
    pub query: Vec<String>,

    /// Endpoint to talk to
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// Enable debug output
    #[arg(short, long, default_value = "false")]
    pub debug: bool,
}
