//! Grammars and helpers shared by the runtime tests.

use std::sync::Arc;

use grove_compiler::{BuildOptions, build_grammar};
use grove_core::{Grammar, dsl::*};
use grove_table::ParseTable;

use crate::{ParseOptions, Parser, SyntaxTree};

pub fn table(grammar: &Grammar) -> Arc<ParseTable> {
    Arc::new(build_grammar(grammar, BuildOptions::default()).expect("grammar should build"))
}

/// `+` and `-` at level 1, `*` at level 2, all left-associative.
pub fn arithmetic() -> Arc<ParseTable> {
    table(
        &Grammar::builder("arith")
            .rule(
                "expr",
                choice([
                    prec_left(1, seq([sym("expr"), "+".into(), sym("expr")])),
                    prec_left(1, seq([sym("expr"), "-".into(), sym("expr")])),
                    prec_left(2, seq([sym("expr"), "*".into(), sym("expr")])),
                    sym("number"),
                ]),
            )
            .rule("number", pattern("[0-9]+"))
            .extra(pattern(r"\s"))
            .build(),
    )
}

/// Statements with fields, a hidden helper rule and keywords.
pub fn statements() -> Arc<ParseTable> {
    table(
        &Grammar::builder("stmts")
            .rule("program", repeat(sym("_statement")))
            .rule("_statement", choice([sym("let"), sym("print")]))
            .rule(
                "let",
                seq([
                    "let".into(),
                    field("name", sym("identifier")),
                    "=".into(),
                    field("value", sym("_value")),
                    ";".into(),
                ]),
            )
            .rule("print", seq(["print".into(), field("value", sym("_value")), ";".into()]))
            .rule("_value", choice([sym("identifier"), sym("number")]))
            .rule("identifier", pattern("[a-z]+"))
            .rule("number", pattern("[0-9]+"))
            .extra(pattern(r"\s"))
            .word("identifier")
            .build(),
    )
}

/// `program := repeat(stmt)`; the repetition helper nests once per item.
pub fn list() -> Arc<ParseTable> {
    table(
        &Grammar::builder("list")
            .rule("program", repeat(sym("stmt")))
            .rule("stmt", seq([sym("identifier"), ";".into()]))
            .rule("identifier", pattern("[a-z]+"))
            .build(),
    )
}

/// Right-associative `^`: each operator nests one level deeper on the right.
pub fn power() -> Arc<ParseTable> {
    table(
        &Grammar::builder("pow")
            .rule(
                "expr",
                choice([prec_right(1, seq([sym("expr"), "^".into(), sym("expr")])), sym("number")]),
            )
            .rule("number", pattern("[0-9]+"))
            .build(),
    )
}

/// `a b` can be read as one pair or as two singles; the grammar asks the
/// parser to keep both readings alive.
pub fn ambiguous() -> Arc<ParseTable> {
    table(
        &Grammar::builder("amb")
            .rule("list", repeat1(choice([sym("pair"), sym("single")])))
            .rule("pair", prec_dynamic(1, seq([sym("item"), sym("item")])))
            .rule("single", sym("item"))
            .rule("item", pattern("[a-z]"))
            .extra(pattern(" "))
            .conflict(["list", "pair", "single"])
            .build(),
    )
}

pub fn parse(table: &Arc<ParseTable>, source: &str) -> SyntaxTree {
    Parser::new(Arc::clone(table)).parse(source.as_bytes())
}

pub fn parse_with(table: &Arc<ParseTable>, options: ParseOptions, source: &str) -> SyntaxTree {
    Parser::new(Arc::clone(table))
        .with_options(options)
        .parse(source.as_bytes())
}

pub fn sexp(table: &Arc<ParseTable>, source: &str) -> String {
    parse(table, source).to_sexp()
}
