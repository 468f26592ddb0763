//! Contextual tokenizer.
//!
//! The parser asks for one token at a time, passing the lex mode of its
//! current state. Only terminals valid in that mode compete:
//! - an external scanner, when any external token is valid, runs first
//! - then every candidate matcher runs; the longest match wins, ties go to
//!   the higher lexical precedence, then to the earlier declaration
//! - keywords are found by matching the word token and comparing its text
//! - when nothing matches, one byte becomes an `ERROR` token

use std::sync::Arc;

use grove_table::{LexMode, ParseTable, Symbol, TokenMatcher};

use crate::subtree::{LeafInfo, Subtree};

/// Stateful recognizer for tokens the built-in matchers cannot express.
///
/// The scanner is consulted before the built-in matchers whenever one of
/// the grammar's external tokens is valid. Its state is snapshotted with
/// [`serialize`](Self::serialize) after every external token and restored
/// with [`deserialize`](Self::deserialize) before every scan, so each stack
/// version sees the state its own tokens produced.
pub trait ExternalScanner {
    /// Recognize one token at the cursor. `valid[i]` tells whether the
    /// grammar's i-th external token is acceptable here. Returns the index
    /// of the recognized token.
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: &[bool]) -> Option<usize>;

    fn serialize(&self) -> Vec<u8>;

    fn deserialize(&mut self, state: &[u8]);
}

/// Input view handed to an [`ExternalScanner`].
#[derive(Debug)]
pub struct ScanCursor<'a> {
    input: &'a [u8],
    start: usize,
    position: usize,
    end: Option<usize>,
}

impl<'a> ScanCursor<'a> {
    pub fn new(input: &'a [u8], start: usize) -> Self {
        Self {
            input,
            start,
            position: start,
            end: None,
        }
    }

    /// Byte under the cursor, `None` at end of input.
    pub fn lookahead(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    pub fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    /// End the token at the cursor. Without a call, the token ends wherever
    /// the cursor stops.
    pub fn mark_end(&mut self) {
        self.end = Some(self.position);
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Bytes advanced past the token start.
    pub fn offset(&self) -> usize {
        self.position - self.start
    }

    fn token_len(&self) -> usize {
        self.end.unwrap_or(self.position) - self.start
    }

    /// One past the last byte the scanner could have looked at.
    fn examined_end(&self) -> usize {
        (self.position + 1).min(self.input.len() + 1)
    }
}

/// A lexed token, not yet placed on a stack.
#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub symbol: Symbol,
    pub start: usize,
    pub len: usize,
    pub lookahead_bytes: usize,
    pub info: LeafInfo,
    /// Scanner state after an external token.
    pub scanner_state: Option<Arc<[u8]>>,
    /// Leaf taken over from the previous tree instead of lexing.
    pub reused: Option<Subtree>,
    /// Old interior node starting with this token, to shift in its place
    /// when the parse state allows.
    pub candidate: Option<Subtree>,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn into_leaf(self, extra: bool, fragile: bool) -> Subtree {
        let leaf = match self.reused {
            Some(leaf) => leaf,
            None => Subtree::leaf(self.symbol, self.len, self.lookahead_bytes, self.info),
        };
        leaf.with_flags(extra, fragile)
    }

    pub fn from_leaf(leaf: Subtree, start: usize) -> Option<Self> {
        let info = leaf.leaf_info()?;
        Some(Self {
            symbol: leaf.symbol(),
            start,
            len: leaf.len(),
            lookahead_bytes: leaf.lookahead_bytes(),
            info,
            scanner_state: None,
            reused: Some(leaf),
            candidate: None,
        })
    }
}

/// External scanner together with the state snapshot to restore before use.
pub(crate) struct ScannerSlot<'s> {
    pub scanner: &'s mut dyn ExternalScanner,
    pub state: Arc<[u8]>,
}

pub(crate) struct Lexer<'a> {
    table: &'a ParseTable,
    input: &'a [u8],
}

#[derive(Clone, Copy)]
struct Candidate {
    symbol: Symbol,
    len: usize,
    precedence: i32,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.len > other.len || (self.len == other.len && self.precedence > other.precedence)
    }
}

impl<'a> Lexer<'a> {
    pub fn new(table: &'a ParseTable, input: &'a [u8]) -> Self {
        Self { table, input }
    }

    pub fn lex(
        &self,
        start: usize,
        lex_mode: usize,
        after_extra: bool,
        scanner: Option<ScannerSlot<'_>>,
    ) -> Token {
        let mode = self.table.lex().mode(lex_mode);
        let info = LeafInfo {
            lex_mode,
            after_extra,
            external: false,
        };
        let mut examined_end = start;

        if let Some(slot) = scanner
            && mode.any_external()
        {
            match self.scan_external(start, mode, slot, info) {
                Ok(token) => return token,
                Err(end) => examined_end = examined_end.max(end),
            }
        }

        if start >= self.input.len() {
            return Token {
                symbol: Symbol::END,
                start,
                len: 0,
                lookahead_bytes: 1,
                info,
                scanner_state: None,
                reused: None,
                candidate: None,
            };
        }

        let rest = &self.input[start..];
        let (best, examined) = self.best_match(rest, mode, after_extra);
        examined_end = examined_end.max(start + examined);

        let (symbol, len) = match best {
            Some(c) => (c.symbol, c.len),
            None => (Symbol::ERROR, 1),
        };
        Token {
            symbol,
            start,
            len,
            lookahead_bytes: examined_end.saturating_sub(start + len),
            info,
            scanner_state: None,
            reused: None,
            candidate: None,
        }
    }

    /// Run every candidate matcher. Returns the winner and how far any of
    /// them looked.
    fn best_match(&self, rest: &[u8], mode: &LexMode, after_extra: bool) -> (Option<Candidate>, usize) {
        let lex = self.table.lex();
        let mut examined = 0;
        let mut best: Option<Candidate> = None;
        let mut best_non_word: Option<Candidate> = None;

        let word = lex.word();
        let wants_keywords = mode.terminals.iter().any(|&s| lex.is_keyword(s));
        let word_valid = word.is_some_and(|w| mode.accepts(w));

        let mut candidates: Vec<Symbol> = mode
            .terminals
            .iter()
            .copied()
            .filter(|&s| !lex.is_keyword(s))
            .collect();
        if let Some(word) = word
            && wants_keywords
            && !word_valid
        {
            let at = candidates.partition_point(|&s| s < word);
            candidates.insert(at, word);
        }

        for symbol in candidates {
            let Some(terminal) = lex.terminal(symbol) else {
                continue;
            };
            if terminal.immediate && after_extra {
                continue;
            }
            let found = terminal.matcher.longest_match(rest);
            examined = examined.max(found.examined);
            let Some(len) = found.len else {
                continue;
            };
            let candidate = Candidate {
                symbol,
                len,
                precedence: terminal.precedence,
            };
            if best.is_none_or(|b| candidate.beats(&b)) {
                best = Some(candidate);
            }
            if Some(symbol) != word && best_non_word.is_none_or(|b| candidate.beats(&b)) {
                best_non_word = Some(candidate);
            }
        }

        let Some(winner) = best else {
            return (None, examined);
        };
        if Some(winner.symbol) != word {
            return (Some(winner), examined);
        }
        let text = &rest[..winner.len];
        if let Some(keyword) = self.keyword_for(text, mode) {
            return (
                Some(Candidate {
                    symbol: keyword,
                    ..winner
                }),
                examined,
            );
        }
        if word_valid {
            (Some(winner), examined)
        } else {
            (best_non_word, examined)
        }
    }

    fn keyword_for(&self, text: &[u8], mode: &LexMode) -> Option<Symbol> {
        let lex = self.table.lex();
        lex.keywords().iter().copied().find(|&k| {
            mode.accepts(k)
                && lex
                    .terminal(k)
                    .is_some_and(|t| matches!(&t.matcher, TokenMatcher::Literal(bytes) if bytes.as_ref() == text))
        })
    }

    /// On failure returns how far the scanner looked.
    fn scan_external(
        &self,
        start: usize,
        mode: &LexMode,
        slot: ScannerSlot<'_>,
        info: LeafInfo,
    ) -> Result<Token, usize> {
        let ScannerSlot { scanner, state } = slot;
        scanner.deserialize(&state);
        let mut cursor = ScanCursor::new(self.input, start);
        let found = scanner.scan(&mut cursor, &mode.externals);
        let examined_end = cursor.examined_end();
        let Some(index) = found.filter(|&i| mode.externals.get(i) == Some(&true)) else {
            return Err(examined_end);
        };
        let Some(&symbol) = self.table.externals().get(index) else {
            return Err(examined_end);
        };
        let len = cursor.token_len();
        tracing::trace!(symbol = self.table.symbol_name(symbol), start, len, "external token");
        Ok(Token {
            symbol,
            start,
            len,
            lookahead_bytes: examined_end.saturating_sub(start + len),
            info: LeafInfo {
                external: true,
                ..info
            },
            scanner_state: Some(scanner.serialize().into()),
            reused: None,
            candidate: None,
        })
    }
}
