use std::fmt;

use crate::automaton::Dfa;
use crate::error::Result;
use crate::grammar::Grammar;

/// The built-in automata, each with the language description and companion
/// grammar shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Strings over `{a, b}`.
    BabAba,
    /// Strings over `{0, 1}`.
    Binary,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::BabAba, Preset::Binary];

    pub fn title(self) -> &'static str {
        match self {
            Preset::BabAba => "RegEx 1",
            Preset::Binary => "RegEx 2",
        }
    }

    pub fn regex(self) -> &'static str {
        match self {
            Preset::BabAba => "(bab+bbb)b*a*(a*+b*)(ab)*(aba)(bab+aba)*bb(a+b)*(bab+aba)(a+b)*",
            Preset::Binary => "(1+0)*0*1*(111+00+101)(1+0)*(101+01+000)(1+0)*(101+000)*",
        }
    }

    pub fn automaton(self) -> Result<Dfa> {
        Dfa::from_json(self.definition_json())
    }

    pub fn grammar(self) -> Result<Grammar> {
        Grammar::parse(self.grammar_text())
    }

    /// File name of the pushdown automaton drawing that accompanies the grammar.
    pub fn pda_diagram(self) -> &'static str {
        match self {
            Preset::BabAba => "PDA1.png",
            Preset::Binary => "PDA 2.png",
        }
    }

    fn definition_json(self) -> &'static str {
        match self {
            Preset::BabAba => include_str!("../presets/bab_aba.json"),
            Preset::Binary => include_str!("../presets/binary.json"),
        }
    }

    fn grammar_text(self) -> &'static str {
        match self {
            Preset::BabAba => include_str!("../presets/bab_aba.cfg"),
            Preset::Binary => include_str!("../presets/binary.cfg"),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.title(), self.regex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        for preset in Preset::ALL {
            let dfa = preset.automaton().unwrap();
            assert_eq!(dfa.initial_state(), "0");
            preset.grammar().unwrap();
        }
    }

    #[test]
    fn test_bab_aba_shape() {
        let dfa = Preset::BabAba.automaton().unwrap();
        assert_eq!(dfa.states().count(), 16);
        assert_eq!(dfa.alphabet(), &['a', 'b']);
        assert_eq!(dfa.final_states().collect::<Vec<_>>(), vec!["15"]);
    }

    #[test]
    fn test_binary_shape() {
        let dfa = Preset::Binary.automaton().unwrap();
        assert_eq!(dfa.states().count(), 10);
        assert_eq!(dfa.alphabet(), &['0', '1']);
        assert_eq!(dfa.final_states().collect::<Vec<_>>(), vec!["8", "9"]);
    }

    #[test]
    fn test_grammar_heads() {
        let grammar = Preset::BabAba.grammar().unwrap();
        let heads = grammar.non_terminals().iter().map(|nt| nt.name()).collect::<Vec<_>>();
        assert_eq!(heads, vec!["S", "A", "B", "C", "D", "E", "F", "G"]);

        let grammar = Preset::Binary.grammar().unwrap();
        assert_eq!(grammar.start_sym.name(), "S");
        assert_eq!(grammar.rules.len(), 17);
    }

    #[test]
    fn test_display() {
        assert!(Preset::Binary.to_string().starts_with("RegEx 2. (1+0)*"));
        assert_eq!(Preset::BabAba.pda_diagram(), "PDA1.png");
    }
}
