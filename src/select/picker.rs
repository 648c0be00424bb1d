//! Interactive choice from a list of labels.

use super::SelectError;
use std::io::{self, BufRead, Write};

/// Presents labelled options and returns the index the operator chose.
pub trait Picker {
    /// Returns `None` if the operator declined to choose.
    fn pick(&mut self, prompt: &str, labels: &[&str]) -> Result<Option<usize>, SelectError>;
}

/// Numbered menu on a terminal.
///
/// Options are listed from 1; an empty line or end of input declines.
/// Invalid entries are asked again.
pub struct TerminalPicker<R, W> {
    input: R,
    output: W,
}

impl TerminalPicker<io::StdinLock<'static>, io::Stderr> {
    /// Reads from stdin and prompts on stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPicker<R, W> {
    /// Reads choices from `input` and writes menus to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Picker for TerminalPicker<R, W> {
    fn pick(&mut self, prompt: &str, labels: &[&str]) -> Result<Option<usize>, SelectError> {
        writeln!(self.output, "{}", prompt)?;
        for (i, label) in labels.iter().enumerate() {
            writeln!(self.output, "  {:>2}) {}", i + 1, label)?;
        }

        loop {
            write!(self.output, "Enter 1-{} (empty to cancel): ", labels.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.is_empty() {
                return Ok(None);
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=labels.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(self.output, "'{}' is not a valid choice", line)?,
            }
        }
    }
}
