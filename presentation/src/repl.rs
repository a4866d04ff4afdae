use std::io::{BufRead, Write};

use anyhow::Result;
use application::qa_service::QaService;
use colored::{Color, Colorize};
use domain::ports::{ChatProvider, EmbeddingProvider};
use shared::utils::is_exit_command;
use tracing::debug;

/// The interactive question loop.
pub struct Repl<'a, E, C> {
    qa: &'a QaService<E, C>,
    subject_name: String,
    short_name: String,
    styled: bool,
}

impl<'a, E: EmbeddingProvider, C: ChatProvider> Repl<'a, E, C> {
    pub fn new(
        qa: &'a QaService<E, C>,
        subject_name: impl Into<String>,
        short_name: impl Into<String>,
    ) -> Self {
        Self {
            qa,
            subject_name: subject_name.into(),
            short_name: short_name.into(),
            styled: false,
        }
    }

    /// Colour labels; only worth it when writing to a terminal.
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// Read questions from `input` until `exit`, `quit` or end of input.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, output: &mut W) -> Result<()> {
        writeln!(
            output,
            "🤖 {} Bot is ready! Ask me anything about {}.",
            self.short_name, self.subject_name
        )?;
        writeln!(output, "Type 'exit' or 'quit' to stop.\n")?;

        let mut raw = Vec::new();
        loop {
            write!(output, "Ask about {} → ", self.short_name)?;
            output.flush()?;

            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                debug!("end of input");
                writeln!(output)?;
                writeln!(output, "👋 Goodbye!")?;
                return Ok(());
            }

            // Invalid UTF-8 is replaced, not fatal.
            let line = String::from_utf8_lossy(&raw);
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit_command(query) {
                writeln!(output, "👋 Goodbye!")?;
                return Ok(());
            }

            match self.qa.answer_question(query).await {
                Ok(exchange) => {
                    let label = format!("🤖 {} Bot:", self.short_name);
                    writeln!(output, "\n{} {}\n", self.paint(&label, Color::Cyan), exchange.answer)?
                }
                Err(e) => writeln!(output, "\n{} {e}\n", self.paint("❌ Error:", Color::Red))?,
            }
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.styled {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}
