//! Build-time errors.
//!
//! Every failure while validating a grammar or constructing its parse table
//! ends up here. These are fatal: without a table there is nothing to parse
//! with. Parsing itself never produces a `GrammarError`.

/// Error raised while validating a grammar or building its parse table.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("grammar defines no rules")]
    EmptyGrammar,

    #[error("rule `{rule}` references undefined symbol `{symbol}`")]
    UndefinedSymbol { rule: String, symbol: String },

    #[error("rule `{rule}` is unreachable from the start rule")]
    UnreachableRule { rule: String },

    #[error("rule `{rule}` can never match any input")]
    NonProductive { rule: String },

    #[error("rule `{rule}` can derive itself without consuming input")]
    CyclicDerivation { rule: String },

    #[error("inline rule `{rule}` expands into itself")]
    InlineCycle { rule: String },

    #[error("start rule `{rule}` {reason}")]
    InvalidStartRule { rule: String, reason: &'static str },

    #[error("external token #{index} must be a symbol or a string")]
    InvalidExternal { index: usize },

    #[error("token rule `{rule}` cannot reference syntax rule `{symbol}`")]
    SymbolInToken { rule: String, symbol: String },

    #[error("invalid pattern `{pattern}` in `{rule}`: {message}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        message: String,
    },

    #[error("token in `{rule}` matches the empty string")]
    EmptyToken { rule: String },

    #[error("extra `{symbol}` must be a token, not a syntax rule")]
    NonTerminalExtra { symbol: String },

    #[error("word token `{symbol}` must be a token rule")]
    InvalidWord { symbol: String },

    #[error("precedence `{name}` is not declared in any precedence ordering")]
    UndefinedPrecedence { name: String },

    #[error("rule `{rule}` expands into too many alternatives")]
    TooManyProductions { rule: String },

    #[error("grammar needs more than {} symbols", u16::MAX)]
    TooManySymbols,

    #[error("invalid grammar JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "unresolved conflict in state {state} on lookahead {lookahead}:\n{}\n{hint}",
        candidates.iter().map(|c| format!("  {c}")).collect::<Vec<_>>().join("\n")
    )]
    Conflict {
        state: usize,
        lookahead: String,
        candidates: Vec<String>,
        hint: String,
    },
}
