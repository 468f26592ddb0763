use grove_core::{FieldId, Symbol, SymbolInfo, SymbolKind, TokenPattern};

use crate::{
    Action, LexMode, LexTable, LexTerminal, ParseState, ParseTable, ProductionInfo, TableParts,
    TokenMatcher,
};

fn info(name: &str, kind: SymbolKind, named: bool) -> SymbolInfo {
    SymbolInfo {
        name: name.to_string(),
        kind,
        visible: kind != SymbolKind::End,
        named,
        supertype: false,
        origin: None,
    }
}

/// root → 'x' field(value)
fn tiny_table() -> ParseTable {
    let x = Symbol::new(2);
    let root = Symbol::new(3);
    let lex = LexTable::new(
        vec![LexTerminal {
            symbol: x,
            matcher: TokenMatcher::build(&TokenPattern::Literal("x".into())).unwrap(),
            precedence: 0,
            immediate: false,
        }],
        vec![
            LexMode {
                terminals: vec![x].into(),
                externals: Box::new([]),
            },
            LexMode::default(),
        ],
        None,
        Vec::new(),
    );
    ParseTable::new(TableParts {
        name: "tiny".into(),
        symbols: vec![
            info("end", SymbolKind::End, false),
            info("ERROR", SymbolKind::Error, true),
            info("x", SymbolKind::Terminal, false),
            info("root", SymbolKind::NonTerminal, true),
        ],
        start: root,
        states: vec![
            ParseState {
                actions: vec![(x, vec![Action::Shift(1)].into())],
                gotos: vec![(root, 2)],
                lex_mode: 0,
                kernel: Vec::new(),
            },
            ParseState {
                actions: vec![(Symbol::END, vec![Action::Reduce(0)].into())],
                gotos: Vec::new(),
                lex_mode: 1,
                kernel: vec![(0, 1)],
            },
            ParseState {
                actions: vec![(Symbol::END, vec![Action::Accept].into())],
                gotos: Vec::new(),
                lex_mode: 1,
                kernel: Vec::new(),
            },
        ],
        productions: vec![ProductionInfo {
            lhs: root,
            rhs: vec![x].into(),
            fields: vec![FieldId::new(1)].into(),
            aliases: vec![None].into(),
            dynamic_precedence: 0,
        }],
        field_names: vec!["value".into()],
        extras: Vec::new(),
        externals: Vec::new(),
        lex,
    })
}

#[test]
fn actions_and_gotos() {
    let table = tiny_table();
    let x = Symbol::new(2);
    assert_eq!(table.actions(0, x), [Action::Shift(1)]);
    assert!(table.actions(0, Symbol::END).is_empty());
    assert_eq!(table.goto(0, table.start_symbol()), Some(2));
    assert_eq!(table.goto(1, table.start_symbol()), None);
    assert_eq!(table.actions(2, Symbol::END), [Action::Accept]);
}

#[test]
fn symbol_queries() {
    let table = tiny_table();
    assert!(table.is_terminal(Symbol::new(2)));
    assert!(!table.is_terminal(Symbol::new(3)));
    assert_eq!(table.display_symbol(Symbol::new(2)), "'x'");
    assert_eq!(table.display_symbol(Symbol::new(3)), "root");
    assert_eq!(table.symbol_for_name("root", true), Some(Symbol::new(3)));
    assert_eq!(table.symbol_for_name("x", true), None);
}

#[test]
fn production_fields() {
    let table = tiny_table();
    let p = table.production(0);
    assert_eq!(p.child_count(), 1);
    let value = table.field_id("value").unwrap();
    assert_eq!(p.field(0), Some(value));
    assert_eq!(p.field(1), None);
    assert_eq!(table.field_name(value), "value");
    assert_eq!(table.field_id("missing"), None);
}

#[test]
fn lex_mode_per_state() {
    let table = tiny_table();
    assert!(table.lex_mode(0).accepts(Symbol::new(2)));
    assert!(!table.lex_mode(1).accepts(Symbol::new(2)));
}

#[test]
fn dump_lists_items_actions_and_gotos() {
    insta::assert_snapshot!(tiny_table().dump(), @r"
    tiny: 3 states, 1 productions, 2 lex modes

    state 0 (lex mode 0)
      'x' => shift 1
      root => goto 2

    state 1 (lex mode 1)
      root → 'x' •
      end => reduce 0

    state 2 (lex mode 1)
      end => accept
    ");
}
