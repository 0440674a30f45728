use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Malformation, Result};

/// The plain record an automaton is described by, as stored in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub states: BTreeSet<String>,
    pub input_symbols: BTreeSet<char>,
    /// Read with a check that no state and no `(state, symbol)` pair appears
    /// twice; JSON itself allows repeated keys.
    #[serde(deserialize_with = "unique_transitions")]
    pub transitions: BTreeMap<String, BTreeMap<char, String>>,
    pub initial_state: String,
    pub final_states: BTreeSet<String>,
}

fn unique_transitions<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, BTreeMap<char, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(TransitionsVisitor)
}

struct TransitionsVisitor;

impl<'de> Visitor<'de> for TransitionsVisitor {
    type Value = BTreeMap<String, BTreeMap<char, String>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from state to its row of transitions")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut transitions = BTreeMap::new();
        while let Some(state) = map.next_key::<String>()? {
            if transitions.contains_key(&state) {
                return Err(de::Error::custom(format_args!(
                    "transitions of state `{}` are given twice",
                    state
                )));
            }
            let row = map.next_value_seed(RowVisitor { state: &state })?;
            transitions.insert(state, row);
        }
        Ok(transitions)
    }
}

/// One state's `symbol -> successor` row.
struct RowVisitor<'s> {
    state: &'s str,
}

impl<'de> DeserializeSeed<'de> for RowVisitor<'_> {
    type Value = BTreeMap<char, String>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RowVisitor<'_> {
    type Value = BTreeMap<char, String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map from symbol to successor for state `{}`", self.state)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = BTreeMap::new();
        while let Some((symbol, target)) = map.next_entry::<char, String>()? {
            if let Some(first) = row.insert(symbol, target) {
                return Err(de::Error::custom(format_args!(
                    "state `{}` has more than one successor on `{}` (`{}` and `{}`)",
                    self.state, symbol, first, row[&symbol]
                )));
            }
        }
        Ok(row)
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A validated, total deterministic finite automaton.
///
/// The transition function is stored as a dense table with one row per state
/// and one column per alphabet symbol, so every lookup during a run is an
/// index computation.
#[derive(Debug, Clone)]
pub struct Dfa {
    names: Vec<String>,
    // sorted, so a column is found by binary search
    alphabet: Vec<char>,
    table: Vec<StateId>,
    initial: StateId,
    finals: Vec<bool>,
}

impl Dfa {
    pub fn new(definition: &Definition) -> Result<Dfa> {
        let Definition { states, input_symbols, transitions, initial_state, final_states } =
            definition;

        if states.is_empty() {
            return Err(Malformation::NoStates.into());
        }

        let names: Vec<String> = states.iter().cloned().collect();
        let alphabet: Vec<char> = input_symbols.iter().copied().collect();
        let id_of = |name: &str| names.binary_search_by(|n| n.as_str().cmp(name)).ok().map(StateId);

        let initial = id_of(initial_state.as_str())
            .ok_or_else(|| Malformation::UnknownInitialState(initial_state.clone()))?;

        let mut finals = vec![false; names.len()];
        for state in final_states {
            let id = id_of(state.as_str())
                .ok_or_else(|| Malformation::UnknownFinalState(state.clone()))?;
            finals[id.0] = true;
        }

        let mut table: Vec<Option<StateId>> = vec![None; names.len() * alphabet.len()];
        for (state, row) in transitions {
            let from = id_of(state.as_str())
                .ok_or_else(|| Malformation::UnknownSourceState(state.clone()))?;
            for (&symbol, target) in row {
                let column = alphabet
                    .binary_search(&symbol)
                    .map_err(|_| Malformation::UnknownSymbol { state: state.clone(), symbol })?;
                let to = id_of(target.as_str()).ok_or_else(|| Malformation::UndefinedTarget {
                    state: state.clone(),
                    symbol,
                    target: target.clone(),
                })?;
                table[from.0 * alphabet.len() + column] = Some(to);
            }
        }

        let table = table
            .into_iter()
            .enumerate()
            .map(|(cell, to)| {
                to.ok_or_else(|| Malformation::MissingTransition {
                    state: names[cell / alphabet.len()].clone(),
                    symbol: alphabet[cell % alphabet.len()],
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            states = names.len(),
            symbols = alphabet.len(),
            initial = %initial_state,
            "built automaton"
        );

        Ok(Dfa { names, alphabet, table, initial, finals })
    }

    pub fn from_json(json: &str) -> Result<Dfa> {
        let definition: Definition = serde_json::from_str(json)?;
        Dfa::new(&definition)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.definition())?)
    }

    /// Rebuilds the record this automaton was constructed from.
    pub fn definition(&self) -> Definition {
        let mut transitions = BTreeMap::<String, BTreeMap<char, String>>::new();
        for (from, symbol, to) in self.transitions() {
            transitions.entry(from.to_string()).or_default().insert(symbol, to.to_string());
        }

        Definition {
            states: self.names.iter().cloned().collect(),
            input_symbols: self.alphabet.iter().copied().collect(),
            transitions,
            initial_state: self.name(self.initial).to_string(),
            final_states: self.final_states().map(str::to_string).collect(),
        }
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn initial_state(&self) -> &str {
        self.name(self.initial)
    }

    pub fn final_states(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .zip(&self.finals)
            .filter(|(_, is_final)| **is_final)
            .map(|(n, _)| n.as_str())
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.state_id(state).is_some_and(|id| self.finals[id.0])
    }

    pub fn state_id(&self, state: &str) -> Option<StateId> {
        self.names.binary_search_by(|n| n.as_str().cmp(state)).ok().map(StateId)
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.names[id.0]
    }

    /// Successor of `state` on `symbol`, or `None` if either is unknown.
    pub fn successor(&self, state: &str, symbol: char) -> Option<&str> {
        let from = self.state_id(state)?;
        let column = self.column(symbol)?;
        Some(self.name(self.next(from, column)))
    }

    /// Every `(from, symbol, to)` triple of the transition function.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, char, &str)> {
        let width = self.alphabet.len();
        self.table.iter().enumerate().map(move |(cell, to)| {
            (self.names[cell / width].as_str(), self.alphabet[cell % width], self.name(*to))
        })
    }

    /// Runs `input` through the automaton.
    ///
    /// Fails on the first character that is not in the alphabet; a rejected
    /// input is an `Ok` run whose verdict is false.
    pub fn evaluate(&self, input: &str) -> Result<Run<'_>> {
        let mut current = self.initial;
        let mut path = Vec::with_capacity(input.len() + 1);
        path.push(current);

        for (position, symbol) in input.chars().enumerate() {
            let column = self.column(symbol).ok_or(Error::InvalidSymbol { symbol, position })?;
            let next = self.next(current, column);
            trace!(from = self.name(current), %symbol, to = self.name(next), "step");
            current = next;
            path.push(current);
        }

        let accepted = self.finals[current.0];
        debug!(input, accepted, end = self.name(current), "evaluated input");

        Ok(Run { dfa: self, input: input.chars().collect(), path, accepted })
    }

    pub fn accepts(&self, input: &str) -> Result<bool> {
        self.evaluate(input).map(|run| run.is_accepted())
    }

    fn column(&self, symbol: char) -> Option<usize> {
        self.alphabet.binary_search(&symbol).ok()
    }

    fn next(&self, from: StateId, column: usize) -> StateId {
        self.table[from.0 * self.alphabet.len() + column]
    }
}

impl TryFrom<&Definition> for Dfa {
    type Error = Error;

    fn try_from(value: &Definition) -> Result<Self> {
        Dfa::new(value)
    }
}

/// One consumed symbol of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    pub from: &'a str,
    pub symbol: char,
    pub to: &'a str,
}

/// The outcome of evaluating one input: the verdict and the visited states.
#[derive(Debug, Clone)]
pub struct Run<'a> {
    dfa: &'a Dfa,
    input: Vec<char>,
    path: Vec<StateId>,
    accepted: bool,
}

impl<'a> Run<'a> {
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    /// Visited states, starting with the initial state. Always one longer than the input.
    pub fn trace(&self) -> Vec<&'a str> {
        self.path.iter().map(|id| self.dfa.name(*id)).collect()
    }

    pub fn state_ids(&self) -> &[StateId] {
        &self.path
    }

    pub fn final_state(&self) -> &'a str {
        // the path always holds at least the initial state
        self.dfa.name(self.path[self.path.len() - 1])
    }

    pub fn steps(&self) -> impl Iterator<Item = Step<'a>> + '_ {
        let dfa = self.dfa;
        self.path.windows(2).zip(&self.input).map(move |(pair, symbol)| Step {
            from: dfa.name(pair[0]),
            symbol: *symbol,
            to: dfa.name(pair[1]),
        })
    }
}

impl fmt::Display for Run<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input.is_empty() {
            writeln!(f, "  (empty input) stays in {}", self.final_state())?;
        }
        for (idx, step) in self.steps().enumerate() {
            writeln!(f, "  {:>3}: {} --{}--> {}", idx + 1, step.from, step.symbol, step.to)?;
        }
        write!(f, "{}", if self.accepted { "[Accepted]" } else { "[Rejected]" })
    }
}
