use colored::Colorize;
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::args::Args;
use crate::{
    core::{
        conversation::ConversationManager,
        dispatcher::{Dispatcher, Session},
        Config, LLMError,
    },
    providers::OpenAIClient,
    tools::{InfoApiTool, ToolRegistry},
};
use std::io::{self, Write};
use std::time::Duration;

const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// Creates the conversation agent for the configured provider
fn create_conversation_manager(
    config: Config,
    enable_tools: bool,
    max_steps: u32,
) -> Result<ConversationManager, LLMError> {
    let system_prompt = config.system_prompt.clone();
    let client = OpenAIClient::new(config)?;
    let registry = enable_tools.then(|| {
        let mut registry = ToolRegistry::new();
        registry.register(InfoApiTool);
        registry
    });
    Ok(ConversationManager::new(
        Box::new(client),
        registry,
        system_prompt,
        max_steps,
    ))
}

pub async fn run(args: Args) -> Result<(), LLMError> {
    let _ = dotenv::dotenv();

    let mut config = Config::load()?;
    let enable_tools = args.enable_tools.unwrap_or(config.enable_tools);
    let max_steps = args.max_steps.unwrap_or(config.max_steps);
    let timeout = args.timeout.map_or_else(|| config.timeout(), Duration::from_secs);

    if let Some(provider) = args.provider {
        config.update_provider(provider);
    }

    debug!(
        "[SETTINGS] provider: {:?}, model: {}, tool_enabled: {enable_tools}, \
         max_steps: {max_steps}, timeout: {timeout:?}",
        config.provider,
        config.get_model()
    );

    let manager = create_conversation_manager(config, enable_tools, max_steps)?;
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        chat_loop(Dispatcher::with_timeout(manager, timeout)).await
    } else {
        ask_once(&manager, &query, timeout).await
    }
}

/// Answers one query, streaming the reply to stdout
async fn ask_once(
    manager: &ConversationManager,
    query: &str,
    timeout: Duration,
) -> Result<(), LLMError> {
    let messages = manager.initial_messages(&[], query);
    let cancel = CancellationToken::new();
    let mut stdout = io::stdout();

    tokio::time::timeout(timeout, manager.run(messages, &mut stdout, &cancel))
        .await
        .map_err(|_| LLMError::Timeout(timeout))??;

    // Ensure final newline
    writeln!(&mut stdout)?;
    Ok(())
}

/// Interactive terminal chat; one session, one dispatch per line
async fn chat_loop(dispatcher: Dispatcher<ConversationManager>) -> Result<(), LLMError> {
    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    writeln!(stdout, "{}", "Type 'exit' to end the conversation.".dimmed())?;
    loop {
        write!(stdout, "{} ", "You:".green().bold())?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(stdout)?;
            break;
        };
        let line = line.trim();
        if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let reply = dispatcher.dispatch(line, &mut session).await;
        writeln!(stdout, "{} {reply}", "LLM:".cyan().bold())?;
        writeln!(stdout, "{}", format!("[{}]", session.status).dimmed())?;
    }

    Ok(())
}
