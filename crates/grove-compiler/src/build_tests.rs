use grove_core::{Grammar, GrammarError, dsl::*};
use grove_table::{Action, ParseTable, StateId};

use crate::{BuildOptions, ResolutionOrder, StateMerging, build_grammar};

fn arithmetic() -> Grammar {
    Grammar::builder("arith")
        .rule(
            "expr",
            choice([
                prec_left(1, seq([sym("expr"), "+".into(), sym("expr")])),
                prec_left(2, seq([sym("expr"), "*".into(), sym("expr")])),
                sym("number"),
            ]),
        )
        .rule("number", pattern("[0-9]+"))
        .extra(pattern(r"\s"))
        .build()
}

fn ambiguous_sum() -> Grammar {
    Grammar::builder("sum")
        .rule(
            "expr",
            choice([seq([sym("expr"), "+".into(), sym("expr")]), sym("number")]),
        )
        .rule("number", pattern("[0-9]+"))
        .build()
}

/// States whose kernel contains the rendered item.
fn states_with_item(table: &ParseTable, item: &str) -> Vec<StateId> {
    (0..table.state_count())
        .filter(|&s| {
            table
                .state(s)
                .kernel
                .iter()
                .any(|&(p, dot)| table.display_production(p, Some(dot)) == item)
        })
        .collect()
}

fn forks(table: &ParseTable) -> usize {
    table
        .states()
        .iter()
        .flat_map(|s| &s.actions)
        .filter(|(_, actions)| actions.len() > 1)
        .count()
}

#[test]
fn dump_small_table() {
    let grammar = Grammar::builder("pair")
        .rule("root", seq([string("a"), string("b")]))
        .build();
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    insta::assert_snapshot!(table.dump(), @r"
    pair: 4 states, 1 productions, 4 lex modes

    state 0 (lex mode 1)
      'a' => shift 1
      root => goto 2

    state 1 (lex mode 2)
      root → 'a' • 'b'
      'b' => shift 3

    state 2 (lex mode 3)
      end => accept

    state 3 (lex mode 3)
      root → 'a' 'b' •
      end => reduce 0
    ");
}

#[test]
fn precedence_and_associativity_settle_conflicts() {
    let table = build_grammar(&arithmetic(), BuildOptions::default()).unwrap();
    assert_eq!(forks(&table), 0);

    let plus = table.symbol_for_name("+", false).unwrap();
    let star = table.symbol_for_name("*", false).unwrap();

    let after_sum = states_with_item(&table, "expr → expr '+' expr •");
    assert!(!after_sum.is_empty());
    for state in after_sum {
        assert_eq!(table.actions(state, plus), [Action::Reduce(0)]);
        assert!(matches!(table.actions(state, star), [Action::Shift(_)]));
    }

    let after_product = states_with_item(&table, "expr → expr '*' expr •");
    assert!(!after_product.is_empty());
    for state in after_product {
        assert_eq!(table.actions(state, plus), [Action::Reduce(1)]);
        assert_eq!(table.actions(state, star), [Action::Reduce(1)]);
    }
}

#[test]
fn right_associativity_shifts() {
    let grammar = Grammar::builder("pow")
        .rule(
            "expr",
            choice([
                prec_right(1, seq([sym("expr"), "^".into(), sym("expr")])),
                sym("number"),
            ]),
        )
        .rule("number", pattern("[0-9]+"))
        .build();
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    let caret = table.symbol_for_name("^", false).unwrap();
    let states = states_with_item(&table, "expr → expr '^' expr •");
    assert!(!states.is_empty());
    for state in states {
        assert!(matches!(table.actions(state, caret), [Action::Shift(_)]));
    }
}

#[test]
fn named_precedence_follows_declared_order() {
    let grammar = Grammar::builder("named")
        .rule(
            "expr",
            choice([
                prec_left("sum", seq([sym("expr"), "+".into(), sym("expr")])),
                prec_left("product", seq([sym("expr"), "*".into(), sym("expr")])),
                sym("number"),
            ]),
        )
        .rule("number", pattern("[0-9]+"))
        .precedence_order(["product", "sum"])
        .build();
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    assert_eq!(forks(&table), 0);

    let star = table.symbol_for_name("*", false).unwrap();
    for state in states_with_item(&table, "expr → expr '+' expr •") {
        assert!(matches!(table.actions(state, star), [Action::Shift(_)]));
    }
}

#[test]
fn unresolved_conflict_is_reported() {
    let err = build_grammar(&ambiguous_sum(), BuildOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r#"
    unresolved conflict in state 4 on lookahead '+':
      shift: expr → expr • '+' expr
      reduce: expr → expr '+' expr •
    add precedence or associativity, or declare the conflict ["expr"]
    "#);
}

#[test]
fn declared_conflict_becomes_fork() {
    let mut grammar = ambiguous_sum();
    grammar.conflicts.push(vec!["expr".into()]);
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    let plus = table.symbol_for_name("+", false).unwrap();

    let states = states_with_item(&table, "expr → expr '+' expr •");
    assert!(!states.is_empty());
    for state in states {
        let actions = table.actions(state, plus);
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::Shift(_)));
        assert_eq!(actions[1], Action::Reduce(0));
    }
}

#[test]
fn resolution_order_decides_whether_precedence_applies() {
    let mut grammar = arithmetic();
    grammar.conflicts.push(vec!["expr".into()]);

    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    assert_eq!(forks(&table), 0);

    let options = BuildOptions::new().resolution_order(ResolutionOrder::DeclaredConflictsFirst);
    let table = build_grammar(&grammar, options).unwrap();
    assert!(forks(&table) > 0);
}

/// LR(1) but not LALR(1): merging the two `c` states mixes lookaheads.
fn lr1_only() -> Grammar {
    Grammar::builder("lr1")
        .rule(
            "s",
            choice([
                seq(["a".into(), sym("x"), "d".into()]),
                seq(["b".into(), sym("y"), "d".into()]),
                seq(["a".into(), sym("y"), "e".into()]),
                seq(["b".into(), sym("x"), "e".into()]),
            ]),
        )
        .rule("x", seq([string("c")]))
        .rule("y", seq([string("c")]))
        .build()
}

#[test]
fn canonical_states_avoid_lalr_merge_conflicts() {
    let canonical = build_grammar(&lr1_only(), BuildOptions::default()).unwrap();
    assert_eq!(forks(&canonical), 0);
    assert_eq!(states_with_item(&canonical, "x → 'c' •").len(), 2);

    let options = BuildOptions::new().state_merging(StateMerging::Lalr);
    let err = build_grammar(&lr1_only(), options).unwrap_err();
    let GrammarError::Conflict { candidates, .. } = &err else {
        panic!("expected a conflict, got {err}");
    };
    assert_eq!(*candidates, ["reduce: x → 'c' •", "reduce: y → 'c' •"]);
}

#[test]
fn lalr_never_has_more_states() {
    let canonical = build_grammar(&arithmetic(), BuildOptions::default()).unwrap();
    let lalr = build_grammar(
        &arithmetic(),
        BuildOptions::new().state_merging(StateMerging::Lalr),
    )
    .unwrap();
    assert!(lalr.state_count() <= canonical.state_count());
    assert_eq!(forks(&lalr), 0);
}

#[test]
fn extras_shift_everywhere() {
    let table = build_grammar(&arithmetic(), BuildOptions::default()).unwrap();
    let space = table.extras()[0];
    for state in table.states() {
        assert_eq!(state.actions(space), [Action::ShiftExtra]);
    }
}

#[test]
fn lex_modes_follow_valid_lookaheads() {
    let table = build_grammar(&arithmetic(), BuildOptions::default()).unwrap();
    let plus = table.symbol_for_name("+", false).unwrap();
    let number = table.symbol_for_name("number", true).unwrap();

    let start = table.lex_mode(0);
    assert!(start.accepts(number));
    assert!(!start.accepts(plus));

    let after_number = states_with_item(&table, "expr → number •");
    for state in after_number {
        let mode = table.lex_mode(state);
        assert!(mode.accepts(plus));
        assert!(!mode.accepts(number));
    }

    let error_mode = table.lex().mode(grove_table::ERROR_LEX_MODE);
    assert!(error_mode.accepts(plus) && error_mode.accepts(number));
}

#[test]
fn keywords_come_from_word_token() {
    let grammar = Grammar::builder("lets")
        .rule("program", repeat(sym("stmt")))
        .rule(
            "stmt",
            choice([seq(["let".into(), sym("ident"), ";".into()]), seq([sym("ident"), ";".into()])]),
        )
        .rule("ident", pattern("[a-z]+"))
        .extra(pattern(r"\s"))
        .word("ident")
        .build();
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    let kw_let = table.symbol_for_name("let", false).unwrap();
    let semi = table.symbol_for_name(";", false).unwrap();
    let ident = table.symbol_for_name("ident", true).unwrap();

    assert_eq!(table.lex().word(), Some(ident));
    assert_eq!(table.lex().keywords(), [kw_let]);
    assert!(!table.lex().is_keyword(semi));
}

#[test]
fn productions_keep_fields_and_dynamic_precedence() {
    let grammar = Grammar::builder("fields")
        .rule(
            "call",
            prec_dynamic(3, seq([field("callee", sym("name")), "(".into(), ")".into()])),
        )
        .rule("name", pattern("[a-z]+"))
        .build();
    let table = build_grammar(&grammar, BuildOptions::default()).unwrap();
    let p = table.production(0);
    assert_eq!(p.dynamic_precedence, 3);
    let callee = table.field_id("callee").unwrap();
    assert_eq!(p.field(0), Some(callee));
    assert_eq!(p.field(1), None);
}
