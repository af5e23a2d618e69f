//! Operator interaction.

use std::io::{self, BufRead, Write};

use crate::Result;

/// Whether an operator answer means "yes".
///
/// Case-insensitive, leading/trailing whitespace ignored, only the first
/// character counts: `y`, `Yes`, `yep` are affirmative; anything else,
/// including an empty answer, is not.
pub fn parse_affirmative(input: &str) -> bool {
    input
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

/// Line-oriented conversation with the operator
pub trait Prompter {
    /// Show text to the operator as is.
    fn say(&mut self, text: &str) -> Result<()>;

    /// Show `question` and return the answer without its line terminator.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (y/n): ", question))?;
        Ok(parse_affirmative(&answer))
    }
}

/// Prompter over any reader/writer pair; stdin/stdout in the CLI.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            )
            .into());
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
