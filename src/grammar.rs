use std::fmt;

use logos::Logos;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct NonTerminal(pub(crate) String);

impl NonTerminal {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for NonTerminal {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Terminal(pub(crate) char);

impl Terminal {
    pub fn new(c: char) -> Self {
        Self(c)
    }

    pub fn symbol(&self) -> char {
        self.0
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum Symbol {
    Term(Terminal),
    NonTerm(NonTerminal),
}

impl From<NonTerminal> for Symbol {
    fn from(value: NonTerminal) -> Self {
        Self::NonTerm(value)
    }
}

impl From<Terminal> for Symbol {
    fn from(value: Terminal) -> Self {
        Self::Term(value)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Term(t) => write!(f, "{}", t.0),
            Symbol::NonTerm(nt) => write!(f, "{}", nt.0),
        }
    }
}

/// One production; an empty right side is the λ production.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Rule {
    pub left: NonTerminal,
    pub right: Vec<Symbol>,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → ", self.left.0)?;
        write_body(f, &self.right)
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &[Symbol]) -> fmt::Result {
    if body.is_empty() {
        return write!(f, "λ");
    }
    for sym in body {
        write!(f, "{}", sym)?;
    }
    Ok(())
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r]+")]
enum Token {
    #[token("→")]
    #[token("->")]
    Arrow,

    #[token("|")]
    Pipe,

    #[token("λ")]
    #[token("ε")]
    Lambda,

    #[regex("[A-Z]", |lex| lex.slice().chars().next())]
    NonTerm(char),

    // anything else that is not blank or reserved is a terminal
    #[regex(r"[^A-Z \t\r\n|λε→-]", |lex| lex.slice().chars().next())]
    #[token("-", |_| '-')]
    Term(char),
}

/// A context-free grammar kept for display next to an automaton.
///
/// The grammar is read, not analysed: nothing checks that it generates the
/// automaton's language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub start_sym: NonTerminal,
    pub rules: Vec<Rule>,
}

impl Grammar {
    /// Reads one head per line, e.g. `B → bB | aB | λ`. The first head is the
    /// start symbol; blank lines are skipped.
    pub fn parse(text: &str) -> Result<Grammar> {
        let mut rules = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            rules.extend(parse_line(idx + 1, line)?);
        }

        let start_sym = rules
            .first()
            .map(|rule: &Rule| rule.left.clone())
            .ok_or(Error::Grammar { line: 0, message: "grammar has no rules".into() })?;

        debug!(start = %start_sym.0, rules = rules.len(), "read grammar");

        Ok(Grammar { start_sym, rules })
    }

    pub fn rules_of(&self, non_term: &NonTerminal) -> impl Iterator<Item = (usize, &Rule)> {
        self.rules.iter().enumerate().filter(move |(_, rule)| rule.left == *non_term)
    }

    /// Heads in the order they first appear.
    pub fn non_terminals(&self) -> Vec<&NonTerminal> {
        let mut seen: Vec<&NonTerminal> = Vec::new();
        for rule in &self.rules {
            if !seen.contains(&&rule.left) {
                seen.push(&rule.left);
            }
        }
        seen
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<Vec<Rule>> {
    let error = |message: &str| Error::Grammar { line: line_no, message: message.to_string() };

    let mut tokens = Vec::new();
    for (token, span) in Token::lexer(line).spanned() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(error(&format!("unexpected `{}`", &line[span]))),
        }
    }

    let mut tokens = tokens.into_iter();
    let left = match tokens.next() {
        Some(Token::NonTerm(c)) => NonTerminal::new(c),
        _ => return Err(error("a rule must start with an upper-case non-terminal")),
    };
    if tokens.next() != Some(Token::Arrow) {
        return Err(error("expected `→` after the rule head"));
    }

    let mut rules = Vec::new();
    let mut body = Vec::new();
    let mut lambda = false;
    let mut alternative_done = |body: &mut Vec<Symbol>, lambda: &mut bool| {
        if body.is_empty() && !*lambda {
            return Err(error("empty alternative, write λ for the empty string"));
        }
        rules.push(Rule { left: left.clone(), right: std::mem::take(body) });
        *lambda = false;
        Ok(())
    };

    for token in tokens {
        match token {
            Token::Pipe => alternative_done(&mut body, &mut lambda)?,
            Token::Lambda if body.is_empty() && !lambda => lambda = true,
            Token::Lambda => return Err(error("λ must stand alone in an alternative")),
            _ if lambda => return Err(error("λ must stand alone in an alternative")),
            Token::NonTerm(c) => body.push(NonTerminal::new(c).into()),
            Token::Term(c) => body.push(Terminal::new(c).into()),
            Token::Arrow => return Err(error("unexpected second `→`")),
        }
    }
    alternative_done(&mut body, &mut lambda)?;

    Ok(rules)
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, head) in self.non_terminals().into_iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{} → ", head.0)?;
            for (alt, (_, rule)) in self.rules_of(head).enumerate() {
                if alt > 0 {
                    write!(f, " | ")?;
                }
                write_body(f, &rule.right)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(s: &str) -> Symbol {
        NonTerminal::new(s).into()
    }

    fn t(c: char) -> Symbol {
        Terminal::new(c).into()
    }

    #[test]
    fn test_parse1() {
        let grammar = Grammar::parse("S → AB\nA → a | λ\nB → b").unwrap();

        assert_eq!(grammar.start_sym, NonTerminal::new("S"));
        assert_eq!(grammar.rules.len(), 4);
        assert_eq!(grammar.rules[0].right, vec![nt("A"), nt("B")]);
        assert_eq!(grammar.rules[1].left, NonTerminal::new("A"));
        assert_eq!(grammar.rules[1].right, vec![t('a')]);
        assert_eq!(grammar.rules[2].right, vec![]);
        assert_eq!(grammar.rules[3].right, vec![t('b')]);
    }

    #[test]
    fn test_parse_ascii_arrow_and_digits() {
        let grammar = Grammar::parse("  F -> 101F | 001F |  ε").unwrap();

        assert_eq!(grammar.start_sym, NonTerminal::new("F"));
        assert_eq!(grammar.rules.len(), 3);
        assert_eq!(grammar.rules[0].right, vec![t('1'), t('0'), t('1'), nt("F")]);
        assert!(grammar.rules[2].right.is_empty());
    }

    #[test]
    fn test_rules_of() {
        let grammar = Grammar::parse("S → ABA\nA → 0A | 1A | λ\nB → 11").unwrap();
        let a = NonTerminal::new("A");
        let rules = grammar.rules_of(&a).map(|(idx, _)| idx).collect::<Vec<_>>();
        assert_eq!(rules, vec![1, 2, 3]);
    }

    #[test]
    fn test_display_groups_alternatives() {
        let text = "S → ABCDEFBGB\nA → bab | bbb\nB → bB | aB | λ";
        let grammar = Grammar::parse(text).unwrap();
        assert_eq!(grammar.to_string(), text);
        assert_eq!(grammar.rules[3].to_string(), "B → bB");
    }

    #[test]
    fn test_errors() {
        let line_of = |text: &str| match Grammar::parse(text) {
            Err(Error::Grammar { line, .. }) => line,
            other => panic!("expected grammar error, got {:?}", other),
        };

        assert_eq!(line_of("S → a\na → b"), 2);
        assert_eq!(line_of("S a"), 1);
        assert_eq!(line_of("S → a ||"), 1);
        assert_eq!(line_of("S → aλ"), 1);
        assert_eq!(line_of("S → a\n\nA → b → c"), 3);
        assert_eq!(line_of(""), 0);
    }
}
