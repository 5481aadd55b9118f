//! Interactive prompts
//!
//! Line-based prompts on top of any `BufRead`/`Write` pair so flows can be
//! driven from stdin or from a buffer.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Outcome of a numbered-choice prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// An option was picked.
    Selected(String),
    /// Empty input on an optional prompt; keep whatever is there.
    Unchanged,
    /// The "No Default" slot was picked; drop the current value.
    Cleared,
}

/// Answer to a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Default,
}

impl Answer {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" => Some(Answer::Default),
            "y" | "yes" => Some(Answer::Yes),
            "n" | "no" => Some(Answer::No),
            _ => None,
        }
    }

    pub fn resolve(self, default: bool) -> bool {
        match self {
            Answer::Yes => true,
            Answer::No => false,
            Answer::Default => default,
        }
    }
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Write a full line to the output.
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Show `prompt` and read one line, without the trailing newline.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from input")?;
        if read == 0 {
            bail!("Input closed while waiting for an answer");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask a yes/no question until the answer is recognised.
    pub fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        loop {
            let reply = self.ask(prompt)?;
            if let Some(answer) = Answer::parse(&reply) {
                return Ok(answer.resolve(default));
            }
        }
    }

    /// Numbered menu over `options`.
    ///
    /// When `current` is set, slot 1 is reserved for "No Default" and the
    /// options start at 2. Non-numeric input re-prompts without a message;
    /// out-of-range numbers and empty input on a required prompt print
    /// `error` first.
    pub fn choose<S: AsRef<str>>(
        &mut self,
        ask: &str,
        options: &[S],
        prompt: &str,
        error: &str,
        optional: bool,
        current: Option<&str>,
    ) -> Result<Choice> {
        writeln!(self.output, "\n{}  Choices are:", ask)?;

        let has_current = current.is_some();
        let offset = if has_current { 2 } else { 1 };

        if has_current {
            writeln!(self.output, " 1 - No Default")?;
        }
        for (idx, option) in options.iter().enumerate() {
            writeln!(self.output, " {} - {}", idx + offset, option.as_ref())?;
        }
        writeln!(self.output)?;

        loop {
            let reply = self.ask(prompt)?;

            if reply.is_empty() {
                if optional {
                    return Ok(Choice::Unchanged);
                }
                self.say(error)?;
                continue;
            }

            let Ok(slot) = reply.trim().parse::<i64>() else {
                continue;
            };

            if has_current && slot == 1 {
                return Ok(Choice::Cleared);
            }

            match slot
                .checked_sub(offset as i64)
                .and_then(|idx| usize::try_from(idx).ok())
                .and_then(|idx| options.get(idx))
            {
                Some(option) => return Ok(Choice::Selected(option.as_ref().to_string())),
                None => self.say(error)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_output()).unwrap()
    }

    const REGIONS: &[&str] = &["us-east", "eu-west", "ap-south"];

    #[test]
    fn test_choose_lists_options_from_one() {
        let mut p = prompter("2\n");
        let choice = p
            .choose("Default region?", REGIONS, "Region: ", "Bad region", true, None)
            .unwrap();
        assert_eq!(choice, Choice::Selected("eu-west".to_string()));

        let out = output(p);
        assert!(out.contains("Default region?  Choices are:"));
        assert!(out.contains(" 1 - us-east"));
        assert!(!out.contains("No Default"));
    }

    #[test]
    fn test_choose_with_current_value_shifts_options() {
        let mut p = prompter("2\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Bad", true, Some("eu-west"))
            .unwrap();
        assert_eq!(choice, Choice::Selected("us-east".to_string()));

        let out = output(p);
        assert!(out.contains(" 1 - No Default"));
        assert!(out.contains(" 2 - us-east"));
        assert!(out.contains(" 4 - ap-south"));
    }

    #[test]
    fn test_choose_slot_one_clears_current_value() {
        let mut p = prompter("1\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Bad", true, Some("eu-west"))
            .unwrap();
        assert_eq!(choice, Choice::Cleared);
    }

    #[test]
    fn test_choose_empty_optional_keeps_current() {
        let mut p = prompter("\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Bad", true, Some("eu-west"))
            .unwrap();
        assert_eq!(choice, Choice::Unchanged);
    }

    #[test]
    fn test_choose_empty_required_shows_error_and_reprompts() {
        let mut p = prompter("\n3\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Pick a region", false, None)
            .unwrap();
        assert_eq!(choice, Choice::Selected("ap-south".to_string()));
        assert_eq!(output(p).matches("Pick a region").count(), 1);
    }

    #[test]
    fn test_choose_ignores_non_numeric_silently() {
        let mut p = prompter("abc\n1.5\n1\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Pick a region", false, None)
            .unwrap();
        assert_eq!(choice, Choice::Selected("us-east".to_string()));

        let out = output(p);
        assert!(!out.contains("Pick a region"));
        assert_eq!(out.matches("Region: ").count(), 3);
    }

    #[test]
    fn test_choose_whitespace_is_not_empty_input() {
        let mut p = prompter("  \n 2 \n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Pick a region", true, Some("eu-west"))
            .unwrap();
        assert_eq!(choice, Choice::Selected("us-east".to_string()));

        let mut p = prompter(" \n1\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Pick a region", false, None)
            .unwrap();
        assert_eq!(choice, Choice::Selected("us-east".to_string()));
        assert!(!output(p).contains("Pick a region"));
    }

    #[test]
    fn test_choose_out_of_range_shows_error() {
        let mut p = prompter("0\n4\n-1\n3\n");
        let choice = p
            .choose("Region?", REGIONS, "Region: ", "Pick a region", false, None)
            .unwrap();
        assert_eq!(choice, Choice::Selected("ap-south".to_string()));
        assert_eq!(output(p).matches("Pick a region").count(), 3);
    }

    #[test]
    fn test_choose_fails_when_input_closes() {
        let mut p = prompter("abc\n");
        assert!(p
            .choose("Region?", REGIONS, "Region: ", "Bad", false, None)
            .is_err());
    }

    #[test]
    fn test_stdio_reads_through_the_stdin_lock() {
        let p: Prompter<StdinLock<'static>, Stdout> = Prompter::stdio();
        drop(p);
    }

    #[test]
    fn test_answer_parse() {
        assert_eq!(Answer::parse("Y"), Some(Answer::Yes));
        assert_eq!(Answer::parse(" yes "), Some(Answer::Yes));
        assert_eq!(Answer::parse("n"), Some(Answer::No));
        assert_eq!(Answer::parse(""), Some(Answer::Default));
        assert_eq!(Answer::parse("   "), Some(Answer::Default));
        assert_eq!(Answer::parse("maybe"), None);
    }

    #[test]
    fn test_confirm_loops_until_recognised() {
        let mut p = prompter("sure\nyes\n");
        assert!(p.confirm("Continue? [y/N]: ", false).unwrap());
        assert_eq!(output(p).matches("Continue?").count(), 2);

        let mut p = prompter("\n");
        assert!(!p.confirm("Continue? [y/N]: ", false).unwrap());
    }
}
