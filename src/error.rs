use thiserror::Error;

/// Defects found while building a [`Dfa`](crate::automaton::Dfa) from its definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Malformation {
    #[error("the automaton declares no states")]
    NoStates,

    #[error("initial state `{0}` is not a declared state")]
    UnknownInitialState(String),

    #[error("final state `{0}` is not a declared state")]
    UnknownFinalState(String),

    #[error("transition source `{0}` is not a declared state")]
    UnknownSourceState(String),

    #[error("transition from `{state}` reads `{symbol}`, which is not in the alphabet")]
    UnknownSymbol { state: String, symbol: char },

    #[error("no transition from `{state}` on `{symbol}`")]
    MissingTransition { state: String, symbol: char },

    #[error("transition from `{state}` on `{symbol}` leads to undeclared state `{target}`")]
    UndefinedTarget { state: String, symbol: char, target: String },
}

#[derive(Debug, Error)]
pub enum Error {
    /// The input contains a character outside the automaton's alphabet.
    #[error("symbol `{symbol}` at position {position} is not in the alphabet")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("malformed automaton: {0}")]
    MalformedAutomaton(#[from] Malformation),

    #[error("cannot read automaton definition: {0}")]
    Definition(#[from] serde_json::Error),

    #[error("grammar line {line}: {message}")]
    Grammar { line: usize, message: String },

    #[error("cannot run the diagram renderer: {0}")]
    Render(#[from] std::io::Error),

    #[error("diagram renderer exited with {status}: {stderr}")]
    RendererFailed { status: std::process::ExitStatus, stderr: String },
}

pub type Result<T> = std::result::Result<T, Error>;
