//! Runs one agent invocation per submission under a hard wall-clock budget.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{error, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::LLMError;
use crate::providers::Message;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Reply shown when the budget runs out
pub const TIMEOUT_REPLY: &str = "Request timed out. Please try again.";

/// Anything that can answer a user message, possibly after several tool round-trips
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// # Arguments
    /// * `message` - The new user message
    /// * `history` - Earlier turns of the same session
    /// * `cancel` - Fired when the caller stops waiting; checked between steps
    async fn run(
        &self,
        message: String,
        history: Vec<Message>,
        cancel: CancellationToken,
    ) -> Result<String, LLMError>;
}

/// Status of the most recent submission in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Processing,
    Succeeded { elapsed: Duration },
    TimedOut { budget: Duration },
    Failed { reason: String },
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting..."),
            Self::Processing => write!(f, "Processing..."),
            Self::Succeeded { elapsed } => write!(f, "Answered in {:.2}s", elapsed.as_secs_f64()),
            Self::TimedOut { budget } => write!(f, "Timeout (>{}s)", budget.as_secs()),
            Self::Failed { reason } => write!(f, "Error: {reason}"),
        }
    }
}

/// Per-session state: the conversation so far and its own status slot.
///
/// Each session owns its status, so concurrent sessions never overwrite each other.
#[derive(Debug, Clone)]
pub struct Session {
    pub history: Vec<Message>,
    pub status: SessionStatus,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub const fn new() -> Self {
        Self {
            history: Vec::new(),
            status: SessionStatus::Connecting,
        }
    }
}

pub struct Dispatcher<A> {
    agent: Arc<A>,
    timeout: Duration,
}

impl<A: Agent> Dispatcher<A> {
    pub fn new(agent: A) -> Self {
        Self::with_timeout(agent, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(agent: A, timeout: Duration) -> Self {
        Self {
            agent: Arc::new(agent),
            timeout,
        }
    }

    /// Submits one message and returns the text to show the user.
    ///
    /// Never fails: errors and timeouts become a reply string plus a status.
    /// On timeout the agent's token is cancelled and its task detached; it
    /// stops at its next checkpoint rather than being killed.
    pub async fn dispatch(&self, message: &str, session: &mut Session) -> String {
        if message.is_empty() {
            return String::new();
        }

        info!("[Dispatch] query received: {message}");
        session.status = SessionStatus::Processing;

        let start = Instant::now();
        let cancel = CancellationToken::new();
        let agent = Arc::clone(&self.agent);
        let task = tokio::spawn({
            let message = message.to_string();
            let history = session.history.clone();
            let cancel = cancel.child_token();
            async move { agent.run(message, history, cancel).await }
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(output))) => {
                let elapsed = start.elapsed();
                info!("[Dispatch] answered in {:.2}s", elapsed.as_secs_f64());
                session.status = SessionStatus::Succeeded { elapsed };
                session.history.push(Message::user(message));
                session.history.push(Message::assistant(output.clone(), Vec::new()));
                output
            }
            Ok(Ok(Err(e))) => Self::fail(session, &e),
            Ok(Err(join_error)) => Self::fail(session, &join_error),
            Err(_) => {
                cancel.cancel();
                warn!("[Dispatch] no answer within {:?}, abandoning", self.timeout);
                session.status = SessionStatus::TimedOut {
                    budget: self.timeout,
                };
                TIMEOUT_REPLY.to_string()
            }
        }
    }

    fn fail(session: &mut Session, e: &dyn std::error::Error) -> String {
        error!("[Dispatch] query failed: {e}");
        session.status = SessionStatus::Failed {
            reason: e.to_string(),
        };
        format!("Internal error: {e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn run(
            &self,
            message: String,
            history: Vec<Message>,
            _cancel: CancellationToken,
        ) -> Result<String, LLMError> {
            Ok(format!("{message} (turn {})", history.len() / 2 + 1))
        }
    }

    struct StuckAgent {
        saw_cancel: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Agent for StuckAgent {
        async fn run(
            &self,
            _message: String,
            _history: Vec<Message>,
            cancel: CancellationToken,
        ) -> Result<String, LLMError> {
            cancel.cancelled().await;
            self.saw_cancel.store(true, Ordering::SeqCst);
            Err(LLMError::Cancelled)
        }
    }

    struct SlowAgent;

    #[async_trait]
    impl Agent for SlowAgent {
        async fn run(
            &self,
            _message: String,
            _history: Vec<Message>,
            _cancel: CancellationToken,
        ) -> Result<String, LLMError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok("eventually".to_string())
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        async fn run(
            &self,
            _message: String,
            _history: Vec<Message>,
            _cancel: CancellationToken,
        ) -> Result<String, LLMError> {
            Err(LLMError::ServerError("upstream exploded".to_string()))
        }
    }

    struct PanickingAgent;

    #[async_trait]
    impl Agent for PanickingAgent {
        async fn run(
            &self,
            _message: String,
            _history: Vec<Message>,
            _cancel: CancellationToken,
        ) -> Result<String, LLMError> {
            panic!("agent bug")
        }
    }

    #[tokio::test]
    async fn test_success_updates_history_and_status() {
        let dispatcher = Dispatcher::new(EchoAgent);
        let mut session = Session::new();
        assert_eq!(session.status, SessionStatus::Connecting);

        assert_eq!(dispatcher.dispatch("hello", &mut session).await, "hello (turn 1)");
        assert_eq!(dispatcher.dispatch("again", &mut session).await, "again (turn 2)");

        assert!(matches!(session.status, SessionStatus::Succeeded { .. }));
        assert!(session.status.to_string().starts_with("Answered in "));
        assert_eq!(session.history.len(), 4);
        assert_eq!(session.history[3].content, "again (turn 2)");
    }

    #[tokio::test]
    async fn test_empty_message_is_ignored() {
        let dispatcher = Dispatcher::new(EchoAgent);
        let mut session = Session::new();

        assert_eq!(dispatcher.dispatch("", &mut session).await, "");
        assert_eq!(session.status, SessionStatus::Connecting);
        assert!(session.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_twenty_seconds() {
        let saw_cancel = Arc::new(AtomicBool::new(false));
        let dispatcher = Dispatcher::new(StuckAgent {
            saw_cancel: Arc::clone(&saw_cancel),
        });
        let mut session = Session::new();

        let reply = dispatcher.dispatch("are you there?", &mut session).await;

        assert_eq!(reply, TIMEOUT_REPLY);
        assert_eq!(
            session.status,
            SessionStatus::TimedOut {
                budget: DEFAULT_TIMEOUT
            }
        );
        assert_eq!(session.status.to_string(), "Timeout (>20s)");
        assert!(session.history.is_empty());

        // the abandoned task observes the cancellation and winds down
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(saw_cancel.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_covers_whole_agent_run() {
        let dispatcher = Dispatcher::new(SlowAgent);
        let mut session = Session::new();

        assert_eq!(dispatcher.dispatch("slow one", &mut session).await, "eventually");

        let SessionStatus::Succeeded { elapsed } = session.status else {
            panic!("unexpected status {:?}", session.status);
        };
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn test_agent_error_becomes_reply() {
        let dispatcher = Dispatcher::new(FailingAgent);
        let mut session = Session::new();

        let reply = dispatcher.dispatch("hi", &mut session).await;

        assert_eq!(reply, "Internal error: Server error: upstream exploded");
        assert_eq!(
            session.status,
            SessionStatus::Failed {
                reason: "Server error: upstream exploded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_panicking_agent_does_not_take_down_caller() {
        let dispatcher = Dispatcher::with_timeout(PanickingAgent, Duration::from_secs(1));
        let mut session = Session::new();

        let reply = dispatcher.dispatch("hi", &mut session).await;

        assert!(reply.starts_with("Internal error: "));
        assert!(matches!(session.status, SessionStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_sessions_keep_separate_status() {
        let dispatcher = Dispatcher::with_timeout(EchoAgent, Duration::from_secs(1));
        let mut first = Session::new();
        let second = Session::new();

        dispatcher.dispatch("only the first", &mut first).await;

        assert!(matches!(first.status, SessionStatus::Succeeded { .. }));
        assert_eq!(second.status, SessionStatus::Connecting);
    }
}
