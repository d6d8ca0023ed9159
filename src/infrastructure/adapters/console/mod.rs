//! Console adapter for the interactive harness

use std::io::{self, BufRead, Write};

use crate::domain::entities::{Session, User};

/// Name the bot goes by when no service is connected
pub const OFFLINE_BOT_NAME: &str = "slask";

/// User every synthesized event is attributed to
pub const OFFLINE_USER: &str = "msguser";

/// Session standing in for a live connection: the bot plus the one offline user
pub fn offline_session() -> Session {
    Session::new(OFFLINE_BOT_NAME)
        .with_team("console")
        .with_user(User::new(OFFLINE_USER, OFFLINE_USER))
}

/// Line-oriented console for local development
pub struct ConsoleAdapter<R, W> {
    input: R,
    output: W,
}

impl ConsoleAdapter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleAdapter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prompt and read one line; `None` on end of input
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
