//! Lexical table construction: token matchers, lex modes, keywords.

use std::collections::HashMap;

use grove_core::{GrammarError, GrammarModel, Symbol, TokenPattern};
use grove_table::{ERROR_LEX_MODE, LexMode, LexTable, LexTerminal, ParseState, TokenMatcher};

/// Compile matchers and assign each state the lex mode for its valid
/// lookaheads. States with identical lookahead sets share a mode.
pub(crate) fn build_lex_table(
    model: &GrammarModel,
    states: &mut [ParseState],
) -> Result<LexTable, GrammarError> {
    let terminals = model
        .terminals()
        .iter()
        .map(|def| {
            let matcher = TokenMatcher::build(&def.pattern).map_err(|e| GrammarError::InvalidPattern {
                rule: model.symbol(def.symbol).name.clone(),
                pattern: e.pattern,
                message: e.message,
            })?;
            Ok(LexTerminal {
                symbol: def.symbol,
                matcher,
                precedence: def.precedence,
                immediate: def.immediate,
            })
        })
        .collect::<Result<Vec<_>, GrammarError>>()?;

    let externals = model.externals();
    let error_mode = LexMode {
        terminals: terminals.iter().map(|t| t.symbol).collect(),
        externals: vec![true; externals.len()].into(),
    };
    let mut modes = vec![error_mode.clone()];
    let mut index = HashMap::from([(error_mode, ERROR_LEX_MODE)]);

    for state in states.iter_mut() {
        let mut valid_terminals = Vec::new();
        let mut valid_externals = vec![false; externals.len()];
        for &(symbol, _) in &state.actions {
            if let Some(i) = externals.iter().position(|&e| e == symbol) {
                valid_externals[i] = true;
            } else if symbol != Symbol::END {
                valid_terminals.push(symbol);
            }
        }
        let mode = LexMode {
            terminals: valid_terminals.into(),
            externals: valid_externals.into(),
        };
        state.lex_mode = match index.get(&mode) {
            Some(&id) => id,
            None => {
                let id = modes.len();
                index.insert(mode.clone(), id);
                modes.push(mode);
                id
            }
        };
    }

    let keywords = keywords(model, &terminals);
    tracing::info!("{} lex modes, {} keywords", modes.len(), keywords.len());
    Ok(LexTable::new(terminals, modes, model.word(), keywords))
}

/// Literal terminals the word token matches in full.
fn keywords(model: &GrammarModel, terminals: &[LexTerminal]) -> Vec<Symbol> {
    let Some(word) = model.word() else {
        return Vec::new();
    };
    let Some(word_matcher) = terminals.iter().find(|t| t.symbol == word).map(|t| &t.matcher) else {
        return Vec::new();
    };
    model
        .terminals()
        .iter()
        .filter(|def| def.symbol != word)
        .filter_map(|def| match &def.pattern {
            TokenPattern::Literal(text) => {
                let m = word_matcher.longest_match(text.as_bytes());
                (m.len == Some(text.len())).then_some(def.symbol)
            }
            TokenPattern::Regex(_) => None,
        })
        .collect()
}
