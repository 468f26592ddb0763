//! Token regexes.

use crate::GrammarError;

/// Wrap a grammar pattern so it composes safely inside larger regexes.
///
/// Only the `i`, `s` and `m` flags have a counterpart; the others (`u`,
/// `g`, `y`, `v`) do not change what a single token matches.
pub(super) fn pattern_regex(value: &str, flags: Option<&str>) -> String {
    let flags: String = flags
        .unwrap_or_default()
        .chars()
        .filter(|c| matches!(c, 'i' | 's' | 'm'))
        .collect();
    if flags.is_empty() {
        format!("(?:{value})")
    } else {
        format!("(?{flags}:{value})")
    }
}

/// Reject regexes that fail to parse or can match the empty string.
pub(super) fn validate(regex: &str, rule: &str) -> Result<(), GrammarError> {
    let hir = regex_syntax::Parser::new()
        .parse(regex)
        .map_err(|e| GrammarError::InvalidPattern {
            rule: rule.to_string(),
            pattern: regex.to_string(),
            message: e.to_string(),
        })?;
    if hir.properties().minimum_len() == Some(0) {
        return Err(GrammarError::EmptyToken {
            rule: rule.to_string(),
        });
    }
    Ok(())
}
