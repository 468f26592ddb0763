//! Token matchers and lex modes.
//!
//! Patterns are compiled to anchored DFAs that report every match, so
//! stepping one to the end gives the longest match. Literals are compared
//! byte by byte.

use regex_automata::dfa::{Automaton, StartKind, dense, sparse};
use regex_automata::{Anchored, Input, MatchKind};

use grove_core::{Symbol, TokenPattern};

/// Lex mode used during error recovery: every terminal is a candidate.
pub const ERROR_LEX_MODE: usize = 0;

#[derive(Debug, thiserror::Error)]
#[error("cannot compile token pattern `{pattern}`: {message}")]
pub struct MatcherError {
    pub pattern: String,
    pub message: String,
}

/// Outcome of running one matcher at one position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenMatch {
    /// Length of the longest non-empty match.
    pub len: Option<usize>,
    /// Bytes inspected before the matcher gave up. One past the input
    /// length when it had to see end of input to decide.
    pub examined: usize,
}

#[derive(Clone, Debug)]
pub enum TokenMatcher {
    Literal(Box<[u8]>),
    Pattern(sparse::DFA<Vec<u8>>),
}

impl TokenMatcher {
    pub fn build(pattern: &TokenPattern) -> Result<Self, MatcherError> {
        let regex = match pattern {
            TokenPattern::Literal(text) => return Ok(Self::Literal(text.as_bytes().into())),
            TokenPattern::Regex(regex) => regex,
        };
        let err = |message: String| MatcherError {
            pattern: regex.clone(),
            message,
        };
        let dense = dense::DFA::builder()
            .configure(
                dense::DFA::config()
                    .start_kind(StartKind::Anchored)
                    .match_kind(MatchKind::All)
                    .minimize(true),
            )
            .build(regex)
            .map_err(|e| err(e.to_string()))?;
        let sparse = dense.to_sparse().map_err(|e| err(e.to_string()))?;
        Ok(Self::Pattern(sparse))
    }

    /// Longest match anchored at the start of `input`.
    pub fn longest_match(&self, input: &[u8]) -> TokenMatch {
        match self {
            Self::Literal(literal) => {
                let common = literal
                    .iter()
                    .zip(input)
                    .take_while(|(a, b)| a == b)
                    .count();
                if common == literal.len() {
                    TokenMatch {
                        len: Some(common),
                        examined: common,
                    }
                } else if common == input.len() {
                    TokenMatch {
                        len: None,
                        examined: input.len() + 1,
                    }
                } else {
                    TokenMatch {
                        len: None,
                        examined: common + 1,
                    }
                }
            }
            Self::Pattern(dfa) => dfa_longest_match(dfa, input),
        }
    }
}

fn dfa_longest_match<A: Automaton>(dfa: &A, input: &[u8]) -> TokenMatch {
    let search = Input::new(input).anchored(Anchored::Yes);
    let Ok(mut state) = dfa.start_state_forward(&search) else {
        return TokenMatch {
            len: None,
            examined: 0,
        };
    };
    let mut len = None;
    for (i, &byte) in input.iter().enumerate() {
        state = dfa.next_state(state, byte);
        if !dfa.is_special_state(state) {
            continue;
        }
        if dfa.is_match_state(state) {
            // Matches surface one byte late: this one ends before `byte`.
            len = Some(i);
        } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
            return TokenMatch {
                len: len.filter(|&n| n > 0),
                examined: i + 1,
            };
        }
    }
    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        len = Some(input.len());
    }
    TokenMatch {
        len: len.filter(|&n| n > 0),
        examined: input.len() + 1,
    }
}

/// One lexical terminal.
#[derive(Clone, Debug)]
pub struct LexTerminal {
    pub symbol: Symbol,
    pub matcher: TokenMatcher,
    pub precedence: i32,
    pub immediate: bool,
}

/// Terminals the lexer may produce in a group of parser states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LexMode {
    /// Candidate terminals, in declaration order.
    pub terminals: Box<[Symbol]>,
    /// Validity of each external token, by position in the externals list.
    pub externals: Box<[bool]>,
}

impl LexMode {
    pub fn accepts(&self, symbol: Symbol) -> bool {
        self.terminals.binary_search(&symbol).is_ok()
    }

    pub fn any_external(&self) -> bool {
        self.externals.iter().any(|&v| v)
    }
}

#[derive(Clone, Debug)]
pub struct LexTable {
    terminals: Vec<LexTerminal>,
    modes: Vec<LexMode>,
    word: Option<Symbol>,
    keywords: Vec<Symbol>,
}

impl LexTable {
    /// `terminals` must be in declaration order with contiguous symbols;
    /// `modes[ERROR_LEX_MODE]` is the error mode.
    pub fn new(
        terminals: Vec<LexTerminal>,
        modes: Vec<LexMode>,
        word: Option<Symbol>,
        keywords: Vec<Symbol>,
    ) -> Self {
        debug_assert!(
            terminals
                .windows(2)
                .all(|w| w[1].symbol.get() == w[0].symbol.get() + 1)
        );
        Self {
            terminals,
            modes,
            word,
            keywords,
        }
    }

    pub fn terminals(&self) -> &[LexTerminal] {
        &self.terminals
    }

    pub fn terminal(&self, symbol: Symbol) -> Option<&LexTerminal> {
        let first = self.terminals.first()?.symbol.index();
        self.terminals.get(symbol.index().checked_sub(first)?)
    }

    pub fn modes(&self) -> &[LexMode] {
        &self.modes
    }

    pub fn mode(&self, id: usize) -> &LexMode {
        &self.modes[id]
    }

    /// Identifier token used to recognize keywords.
    pub fn word(&self) -> Option<Symbol> {
        self.word
    }

    /// Literal terminals that the word token matches in full. These are
    /// never matched directly; the word token is matched and its text
    /// compared against them.
    pub fn keywords(&self) -> &[Symbol] {
        &self.keywords
    }

    pub fn is_keyword(&self, symbol: Symbol) -> bool {
        self.keywords.contains(&symbol)
    }
}
