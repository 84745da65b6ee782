use kbchat_app::ChatSink;
use kbchat_domain::{LookupArgs, LookupClassification};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Prints assistant text as it streams in. Lookup progress goes to the same
/// writer on its own line.
pub struct ConsoleSink<W> {
    writer: W,
    at_line_start: bool,
}

impl<W> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, at_line_start: true }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl ConsoleSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSink<W> {
    async fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        if !self.at_line_start {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        self.at_line_start = true;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send> ChatSink for ConsoleSink<W> {
    async fn stream_token(&mut self, token: &str) -> anyhow::Result<()> {
        self.writer.write_all(token.as_bytes()).await?;
        self.writer.flush().await?;
        self.at_line_start = token.ends_with('\n');
        Ok(())
    }

    async fn tool_call_start(&mut self, args: &LookupArgs) -> anyhow::Result<()> {
        self.write_line(&format!("[DBpedia lookup: {}]", args.query)).await
    }

    async fn tool_call_end(&mut self, classification: LookupClassification) -> anyhow::Result<()> {
        if !classification.is_hit() {
            self.write_line("[DBpedia lookup: no relevant results]").await?;
        }
        Ok(())
    }

    async fn update(&mut self) -> anyhow::Result<()> {
        if !self.at_line_start {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        self.at_line_start = true;
        Ok(())
    }
}
