use grove_core::{Symbol, TokenPattern};

use crate::{LexMode, LexTable, LexTerminal, TokenMatch, TokenMatcher};

fn regex(re: &str) -> TokenMatcher {
    TokenMatcher::build(&TokenPattern::Regex(re.to_string())).unwrap()
}

fn literal(text: &str) -> TokenMatcher {
    TokenMatcher::build(&TokenPattern::Literal(text.to_string())).unwrap()
}

#[test]
fn literal_match() {
    assert_eq!(
        literal("if").longest_match(b"if x"),
        TokenMatch {
            len: Some(2),
            examined: 2
        }
    );
}

#[test]
fn literal_mismatch_counts_the_failing_byte() {
    assert_eq!(
        literal("if").longest_match(b"ix"),
        TokenMatch {
            len: None,
            examined: 2
        }
    );
}

#[test]
fn literal_cut_short_by_end_of_input() {
    assert_eq!(
        literal("if").longest_match(b"i"),
        TokenMatch {
            len: None,
            examined: 2
        }
    );
}

#[test]
fn pattern_running_to_end_of_input_examines_past_it() {
    assert_eq!(
        regex("[0-9]+").longest_match(b"12"),
        TokenMatch {
            len: Some(2),
            examined: 3
        }
    );
}

#[test]
fn pattern_fails_on_first_byte() {
    assert_eq!(
        regex("[0-9]+").longest_match(b"ab"),
        TokenMatch {
            len: None,
            examined: 1
        }
    );
}

#[test]
fn pattern_prefers_longest_alternative() {
    let m = regex("(?:a|ab)").longest_match(b"abc");
    assert_eq!(m.len, Some(2));
    assert!(m.examined >= 3);
}

#[test]
fn pattern_stops_before_trailing_bytes() {
    let m = regex("[a-z]+").longest_match(b"abc def");
    assert_eq!(m.len, Some(3));
    assert!(m.examined > 3);
    assert!(m.examined <= 5);
}

#[test]
fn empty_input_never_matches() {
    assert_eq!(regex("[0-9]+").longest_match(b"").len, None);
    assert_eq!(literal("x").longest_match(b"").len, None);
}

#[test]
fn invalid_regex_is_reported() {
    let err = TokenMatcher::build(&TokenPattern::Regex("[a-".to_string())).unwrap_err();
    assert_eq!(err.pattern, "[a-");
}

#[test]
fn lex_table_lookup() {
    let terminals = vec![
        LexTerminal {
            symbol: Symbol::new(2),
            matcher: regex("[a-z]+"),
            precedence: 0,
            immediate: false,
        },
        LexTerminal {
            symbol: Symbol::new(3),
            matcher: literal("if"),
            precedence: 0,
            immediate: false,
        },
    ];
    let modes = vec![LexMode {
        terminals: vec![Symbol::new(2), Symbol::new(3)].into(),
        externals: Box::new([]),
    }];
    let lex = LexTable::new(terminals, modes, Some(Symbol::new(2)), vec![Symbol::new(3)]);

    assert_eq!(lex.terminal(Symbol::new(3)).unwrap().symbol, Symbol::new(3));
    assert!(lex.terminal(Symbol::new(4)).is_none());
    assert!(lex.terminal(Symbol::END).is_none());
    assert!(lex.is_keyword(Symbol::new(3)));
    assert!(lex.mode(0).accepts(Symbol::new(2)));
    assert!(!lex.mode(0).accepts(Symbol::new(5)));
    assert!(!lex.mode(0).any_external());
}
