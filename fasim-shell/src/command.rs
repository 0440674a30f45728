//! Shell commands. Anything that is not a `:` command is an input string.

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `:preset N`, 1-based as printed in the menu
    Preset(usize),
    Grammar,
    Regex,
    Pda,
    /// `:empty` evaluates the empty string
    Empty,
    /// `:render` toggles writing a diagram after each evaluation
    Render,
    Help,
    Quit,
    /// Nothing was typed
    Blank,
    Evaluate(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Command::Blank);
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Ok(Command::Evaluate(line.to_string()));
        };

        let mut words = rest.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "preset" | "p" => {
                let Some(arg) = words.next() else { bail!("usage: :preset N") };
                match arg.parse() {
                    Ok(n) => Command::Preset(n),
                    Err(_) => bail!("`{}` is not a preset number", arg),
                }
            }
            "grammar" | "g" => Command::Grammar,
            "regex" | "r" => Command::Regex,
            "pda" => Command::Pda,
            "empty" | "e" => Command::Empty,
            "render" => Command::Render,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => bail!("unknown command `:{}`, try :help", other),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument `{}`", extra);
        }
        Ok(command)
    }
}

pub const HELP: &str = "\
  <string>     run the string through the selected automaton
  :preset N    select preset N
  :grammar     show the companion context-free grammar
  :regex       show the regular expression of the preset
  :pda         name the pushdown automaton diagram of the preset
  :empty       run the empty string
  :render      toggle writing automaton.svg after each run
  :help        this text
  :quit        leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs() {
        assert_eq!(Command::parse("abba").unwrap(), Command::Evaluate("abba".into()));
        assert_eq!(Command::parse(" a b").unwrap(), Command::Evaluate(" a b".into()));
        assert_eq!(Command::parse("   ").unwrap(), Command::Blank);
    }

    #[test]
    fn test_commands() {
        assert_eq!(Command::parse(":preset 2").unwrap(), Command::Preset(2));
        assert_eq!(Command::parse(" :p 1 ").unwrap(), Command::Preset(1));
        assert_eq!(Command::parse(":grammar").unwrap(), Command::Grammar);
        assert_eq!(Command::parse(":empty").unwrap(), Command::Empty);
        assert_eq!(Command::parse(":q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_bad_commands() {
        assert!(Command::parse(":preset").is_err());
        assert!(Command::parse(":preset two").is_err());
        assert!(Command::parse(":grammar now").is_err());
        assert!(Command::parse(":frobnicate").is_err());
        assert!(Command::parse(":").is_err());
    }
}
