use crate::components::vrchat::session::{ChallengeResponder, TwoFactorMethod};
use crate::error::{other_error, RelayResult};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

type LineSource = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Line-oriented operator input shared by the console and login prompts
#[derive(Clone)]
pub struct OperatorInput {
    lines: Arc<Mutex<LineSource>>,
}

impl OperatorInput {
    /// Read from the process's standard input
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    /// Read from any buffered source
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let boxed: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        Self {
            lines: Arc::new(Mutex::new(boxed.lines())),
        }
    }

    /// Show a prompt and wait for the next line; `None` once input is closed
    pub async fn read_line(&self, prompt: &str) -> RelayResult<Option<String>> {
        let mut lines = self.lines.lock().await;

        print!("{}", prompt);
        std::io::stdout().flush()?;

        Ok(lines.next_line().await?)
    }
}

#[async_trait]
impl ChallengeResponder for OperatorInput {
    async fn respond(&self, method: TwoFactorMethod) -> RelayResult<String> {
        match self.read_line(method.prompt()).await? {
            Some(code) if !code.trim().is_empty() => Ok(code.trim().to_string()),
            Some(_) => Err(other_error("Empty two-factor code")),
            None => Err(other_error("Input closed before a two-factor code was entered")),
        }
    }
}
