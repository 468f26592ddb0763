use std::sync::Arc;

use crate::test_utils::{ambiguous, arithmetic};
use crate::{Edit, Parser, PrintTracer, Verbosity};

fn events(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(|line| line.split_whitespace().next().unwrap_or_default())
        .collect()
}

#[test]
fn default_verbosity_logs_stack_operations() {
    let table = arithmetic();
    let source = b"1";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::Default);
    Parser::new(Arc::clone(&table)).parse_with(source, &mut tracer);

    assert_eq!(events(tracer.lines()), ["shift", "reduce", "accept"]);
    assert!(tracer.lines()[0].starts_with("shift   number -> "));
    assert!(tracer.lines()[1].starts_with("reduce  expr → number -> "));
}

#[test]
fn verbose_adds_tokens() {
    let table = arithmetic();
    let source = b"1 ";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::VeryVerbose);
    Parser::new(Arc::clone(&table)).parse_with(source, &mut tracer);

    let lines = tracer.lines();
    assert_eq!(lines[0], r#"lex     number "1" @0"#);
    assert!(lines.iter().any(|l| l.starts_with("extra   ")));
    assert!(lines.iter().any(|l| l == r#"lex     end "" @2"#));
}

#[test]
fn recovery_is_traced() {
    let table = arithmetic();
    let source = b"1+";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::Default);
    Parser::new(Arc::clone(&table)).parse_with(source, &mut tracer);

    let recover = tracer
        .lines()
        .iter()
        .find(|l| l.starts_with("recover"))
        .unwrap();
    assert!(recover.starts_with("recover pop 1, skip 0 -> "));
    assert_eq!(events(tracer.lines()).last(), Some(&"accept"));
}

#[test]
fn skipped_tokens_are_traced() {
    let table = arithmetic();
    let source = b"#";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::Default);
    Parser::new(Arc::clone(&table)).parse_with(source, &mut tracer);

    assert_eq!(events(tracer.lines()), ["skip", "recover", "accept"]);
    assert_eq!(tracer.lines()[0], "skip    ERROR @0");
}

#[test]
fn forks_and_limits() {
    let table = ambiguous();
    let source = b"a b";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::Verbose);
    Parser::new(Arc::clone(&table)).parse_with(source, &mut tracer);
    assert!(tracer.lines().iter().any(|l| l == "fork    2 ways"));
    assert!(!tracer.lines().iter().any(|l| l.starts_with("limit")));
}

#[test]
fn reuse_is_traced() {
    let table = arithmetic();
    let mut parser = Parser::new(Arc::clone(&table));
    let old = parser.parse(b"1+2*3");

    let source = b"1-2*3";
    let mut tracer = PrintTracer::new(source, &table, Verbosity::Verbose);
    parser
        .reparse_with(&old, &[Edit::replace(1..2, 1)], source, &mut tracer)
        .unwrap();
    assert!(tracer.lines().iter().any(|l| l == "reuse   expr @2"));
}
