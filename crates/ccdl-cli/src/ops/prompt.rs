//! Interactive prompting.
//!
//! Prompts are the only place ccdl reads from stdin. Sessions that cannot
//! prompt get [`NoPrompt`], which declines every question so the caller can
//! report the unresolved choice instead.

use std::collections::VecDeque;
use std::io::{BufRead, IsTerminal, Result, Write};

/// One selectable value with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// A choice shown as its own value.
    pub fn bare(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: String::new(),
            value,
        }
    }
}

pub trait Prompt: Send {
    /// Ask for a value. Empty input selects `default`. `None` means the
    /// question cannot be answered in this session.
    fn ask(&mut self, question: &str, choices: &[Choice], default: Option<&str>) -> Result<Option<String>>;

    /// Yes/no question; `None` when it cannot be answered.
    fn confirm(&mut self, question: &str, default_yes: bool) -> Result<Option<bool>>;

    fn is_interactive(&self) -> bool;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    /// Padding between choice value and label.
    pub width: usize,
}

impl TerminalPrompt {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut input = String::new();
        std::io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str, choices: &[Choice], default: Option<&str>) -> Result<Option<String>> {
        if !choices.is_empty() {
            println!();
            for choice in choices {
                if choice.label.is_empty() {
                    println!("  {}", choice.value);
                } else {
                    let tag = format!("[{}]", choice.value);
                    println!("  {tag:<width$} {}", choice.label, width = self.width + 2);
                }
            }
        }

        let hint = default.map(|d| format!(", or nothing for [{d}]")).unwrap_or_default();
        let answer = self.read_line(&format!("\n{question}{hint}: "))?;
        if answer.is_empty() {
            return Ok(default.map(str::to_string));
        }
        Ok(Some(answer))
    }

    fn confirm(&mut self, question: &str, default_yes: bool) -> Result<Option<bool>> {
        let hint = if default_yes { "(Y/n)" } else { "(y/N)" };
        loop {
            let answer = self.read_line(&format!("\n{question} {hint}: "))?.to_ascii_lowercase();
            match answer.as_str() {
                "" => return Ok(Some(default_yes)),
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => {}
            }
        }
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Declines every question.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, _: &str, _: &[Choice], _: Option<&str>) -> Result<Option<String>> {
        Ok(None)
    }

    fn confirm(&mut self, _: &str, _: bool) -> Result<Option<bool>> {
        Ok(None)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Answers from a fixed script; used to drive flows without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    /// Questions asked so far.
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str, _: &[Choice], default: Option<&str>) -> Result<Option<String>> {
        self.asked.push(question.to_string());
        Ok(match self.answers.pop_front() {
            Some(answer) if answer.is_empty() => default.map(str::to_string),
            other => other,
        })
    }

    fn confirm(&mut self, question: &str, default_yes: bool) -> Result<Option<bool>> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front().map(|answer| match answer.as_str() {
            "" => default_yes,
            other => other.eq_ignore_ascii_case("y"),
        }))
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Terminal prompts when stdin is a terminal and prompting is allowed.
pub fn for_session(non_interactive: bool, width: usize) -> Box<dyn Prompt> {
    if !non_interactive && std::io::stdin().is_terminal() {
        Box::new(TerminalPrompt::new(width))
    } else {
        Box::new(NoPrompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prompt_declines() {
        let mut prompt = NoPrompt;
        assert_eq!(prompt.ask("q", &[Choice::bare("a")], Some("a")).unwrap(), None);
        assert_eq!(prompt.confirm("q", true).unwrap(), None);
        assert!(!prompt.is_interactive());
    }

    #[test]
    fn test_scripted_prompt_uses_default_for_empty_answer() {
        let mut prompt = ScriptedPrompt::new(["", "x", "n"]);
        assert_eq!(prompt.ask("first", &[], Some("d")).unwrap().as_deref(), Some("d"));
        assert_eq!(prompt.ask("second", &[], None).unwrap().as_deref(), Some("x"));
        assert_eq!(prompt.confirm("again?", true).unwrap(), Some(false));
        assert_eq!(prompt.asked, vec!["first", "second", "again?"]);
    }
}
