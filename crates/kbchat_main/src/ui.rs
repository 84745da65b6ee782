use kbchat_app::{Orchestrator, Services};
use kbchat_domain::SessionId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::{Command, ConsoleSink};

/// Interactive console front end; one session per run until `/new`.
pub struct UI<S> {
    orch: Orchestrator<S>,
    session: SessionId,
    history_len: usize,
}

impl<S: Services> UI<S> {
    pub fn new(orch: Orchestrator<S>) -> Self {
        Self { orch, session: SessionId::generate(), history_len: 0 }
    }

    /// Processes a single prompt and returns.
    pub async fn prompt(&mut self, text: impl Into<String>) -> anyhow::Result<()> {
        self.chat(text.into()).await
    }

    /// Reads lines from stdin until `/exit` or end of input. A failed turn is
    /// reported and the session stays usable.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let treatment = self.orch.get_treatment();
        info!(treatment = %treatment.name, session = %self.session, "Starting interactive session");

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(
                format!(
                    "kbchat ({}). Commands: {}\n",
                    treatment.name,
                    Command::available_commands().join(", ")
                )
                .as_bytes(),
            )
            .await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Command::Empty => continue,
                Command::Exit => break,
                Command::History => {
                    let message = self.history_summary();
                    stdout.write_all(format!("{message}\n").as_bytes()).await?;
                }
                Command::New => {
                    self.session = SessionId::generate();
                    self.history_len = 0;
                    info!(session = %self.session, "Started new session");
                    stdout.write_all(b"Started a new session.\n").await?;
                }
                Command::Message(text) => {
                    if let Err(err) = self.chat(text).await {
                        error!(error = ?err, "Turn failed");
                        let mut stderr = tokio::io::stderr();
                        stderr.write_all(format!("Error: {err:#}\n").as_bytes()).await?;
                    }
                }
            }
        }

        Ok(())
    }

    fn history_summary(&self) -> String {
        if self.orch.get_treatment().use_history {
            format!("{} turns in session history", self.history_len)
        } else {
            format!(
                "History is disabled for treatment '{}'",
                self.orch.get_treatment().name
            )
        }
    }

    async fn chat(&mut self, text: String) -> anyhow::Result<()> {
        let mut sink = ConsoleSink::stdout();
        let outcome = self.orch.handle_turn(self.session, text, &mut sink).await?;
        self.history_len = outcome.history.len();
        Ok(())
    }
}
