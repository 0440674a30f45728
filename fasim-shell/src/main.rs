use anyhow::{Context, Result};
use colored::Colorize;
use fasim::render::{Configuration, Renderer};
use fasim::{Dfa, Error, Preset};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::command::{Command, HELP};

mod command;

struct Session {
    preset: Preset,
    dfa: Dfa,
    render: bool,
    renderer: Renderer,
}

impl Session {
    fn new(preset: Preset) -> Result<Self> {
        let dfa = preset.automaton().with_context(|| format!("loading {}", preset.title()))?;
        Ok(Self { preset, dfa, render: false, renderer: Configuration::new().build() })
    }

    fn select(&mut self, number: usize) -> Result<()> {
        let Some(preset) = number.checked_sub(1).and_then(|idx| Preset::ALL.get(idx)) else {
            anyhow::bail!("there is no preset {}, pick 1..={}", number, Preset::ALL.len());
        };
        self.dfa = preset.automaton().with_context(|| format!("loading {}", preset.title()))?;
        self.preset = *preset;
        println!("{}", self.preset.to_string().bold());
        Ok(())
    }

    fn evaluate(&self, input: &str) {
        let run = match self.dfa.evaluate(input) {
            Ok(run) => run,
            Err(Error::InvalidSymbol { symbol, position }) => {
                println!(
                    "{}: `{}` at position {} is not one of {:?}",
                    "INVALID SYMBOL".yellow().bold(),
                    symbol,
                    position,
                    self.dfa.alphabet()
                );
                return;
            }
            Err(e) => {
                println!("{}: {}", "ERROR".red().bold(), e);
                return;
            }
        };

        println!("{}", run);
        if run.is_accepted() {
            println!("{}", "VALID".green().bold());
        } else {
            println!("{}", "INVALID".red().bold());
        }

        if self.render {
            match self.renderer.render(&self.dfa, Some(&run), "automaton") {
                Ok(path) => println!(
                    "Transition graph for string {} written to {}",
                    input.bold(),
                    path.display()
                ),
                Err(e) => warn!("could not render the transition graph: {}", e),
            }
        }
    }

    /// Returns false once the user asked to leave.
    fn handle(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Preset(n) => self.select(n)?,
            Command::Grammar => println!("{}", self.preset.grammar()?),
            Command::Regex => println!("{}", self.preset.regex()),
            Command::Pda => println!("{}", self.preset.pda_diagram()),
            Command::Empty => self.evaluate(""),
            Command::Render => {
                self.render = !self.render;
                println!("rendering {}", if self.render { "on" } else { "off" });
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
            Command::Blank => println!("You need to enter a string!"),
            Command::Evaluate(input) => self.evaluate(&input),
        }
        Ok(true)
    }
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .try_init();

    println!("{}", "Deterministic Finite Automaton (DFA) Simulator".cyan().bold());
    for (idx, preset) in Preset::ALL.iter().enumerate() {
        println!("  {}) {}", idx + 1, preset);
    }
    println!("type :help for commands");

    let mut session = Session::new(Preset::ALL[0])?;
    println!("{}", session.preset.to_string().bold());

    let mut editor = DefaultEditor::new()?;
    loop {
        let prompt = format!("{}> ", session.preset.title().bright_cyan());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            if let Err(e) = editor.add_history_entry(line.as_str()) {
                warn!("could not record history: {}", e);
            }
        }

        let keep_going = match Command::parse(&line) {
            Ok(command) => session.handle(command),
            Err(e) => {
                println!("{}: {}", "error".red(), e);
                Ok(true)
            }
        };
        match keep_going {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{}: {:#}", "error".red(), e),
        }
    }

    Ok(())
}
