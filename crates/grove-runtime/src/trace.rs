//! Parse tracing for debugging grammars.
//!
//! The parse loop is generic over [`Tracer`], so tracing costs nothing when
//! unused: [`NoopTracer`] methods are `#[inline(always)]` and empty, and no
//! tracing state is kept in stacks or versions. [`PrintTracer`] resolves
//! symbol and production names itself and collects one line per event.

use grove_table::{ParseTable, ProductionId, StateId, Symbol};

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Shifts, reductions, recovery and accept.
    #[default]
    Default,
    /// Also lexed tokens, forks, merges and reuse.
    Verbose,
    /// Also token text.
    VeryVerbose,
}

/// Parser instrumentation.
///
/// Methods receive raw ids and byte offsets; name resolution is left to the
/// implementation.
pub trait Tracer {
    /// A token was lexed (or taken from the previous tree) at `start`.
    fn trace_lex(&mut self, symbol: Symbol, start: usize, len: usize);

    /// A token was shifted, moving to `state`.
    fn trace_shift(&mut self, symbol: Symbol, state: StateId);

    /// A token was shifted as an extra.
    fn trace_shift_extra(&mut self, symbol: Symbol);

    /// A production was reduced, moving to `state`.
    fn trace_reduce(&mut self, production: ProductionId, state: StateId);

    /// A version split into `count` alternatives.
    fn trace_fork(&mut self, count: usize);

    /// Two versions met in the same configuration; one was kept.
    fn trace_merge(&mut self, position: usize);

    /// Versions beyond the fork limit were dropped.
    fn trace_limit(&mut self, dropped: usize);

    /// A token was skipped during recovery.
    fn trace_skip(&mut self, symbol: Symbol, start: usize, len: usize);

    /// Recovery resumed after wrapping `popped` stack entries and `skipped`
    /// tokens in an error node.
    fn trace_recover(&mut self, popped: usize, skipped: usize, state: StateId);

    /// A whole subtree from the previous tree was shifted.
    fn trace_reuse(&mut self, symbol: Symbol, start: usize, len: usize);

    fn trace_accept(&mut self);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_lex(&mut self, _symbol: Symbol, _start: usize, _len: usize) {}

    #[inline(always)]
    fn trace_shift(&mut self, _symbol: Symbol, _state: StateId) {}

    #[inline(always)]
    fn trace_shift_extra(&mut self, _symbol: Symbol) {}

    #[inline(always)]
    fn trace_reduce(&mut self, _production: ProductionId, _state: StateId) {}

    #[inline(always)]
    fn trace_fork(&mut self, _count: usize) {}

    #[inline(always)]
    fn trace_merge(&mut self, _position: usize) {}

    #[inline(always)]
    fn trace_limit(&mut self, _dropped: usize) {}

    #[inline(always)]
    fn trace_skip(&mut self, _symbol: Symbol, _start: usize, _len: usize) {}

    #[inline(always)]
    fn trace_recover(&mut self, _popped: usize, _skipped: usize, _state: StateId) {}

    #[inline(always)]
    fn trace_reuse(&mut self, _symbol: Symbol, _start: usize, _len: usize) {}

    #[inline(always)]
    fn trace_accept(&mut self) {}
}

/// Tracer that collects a readable parse log.
pub struct PrintTracer<'s> {
    /// Source, for token text.
    source: &'s [u8],
    table: &'s ParseTable,
    verbosity: Verbosity,
    /// Collected trace lines.
    lines: Vec<String>,
}

impl<'s> PrintTracer<'s> {
    pub fn new(source: &'s [u8], table: &'s ParseTable, verbosity: Verbosity) -> Self {
        Self {
            source,
            table,
            verbosity,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn verbose(&self) -> bool {
        self.verbosity != Verbosity::Default
    }

    /// Symbol, plus its text at very verbose level.
    fn token(&self, symbol: Symbol, start: usize, len: usize) -> String {
        let name = self.table.display_symbol(symbol);
        if self.verbosity != Verbosity::VeryVerbose {
            return name;
        }
        let text = self.source.get(start..start + len).unwrap_or_default();
        format!("{name} {:?}", String::from_utf8_lossy(text))
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_lex(&mut self, symbol: Symbol, start: usize, len: usize) {
        if self.verbose() {
            let token = self.token(symbol, start, len);
            self.lines.push(format!("lex     {token} @{start}"));
        }
    }

    fn trace_shift(&mut self, symbol: Symbol, state: StateId) {
        let symbol = self.table.display_symbol(symbol);
        self.lines.push(format!("shift   {symbol} -> {state}"));
    }

    fn trace_shift_extra(&mut self, symbol: Symbol) {
        let symbol = self.table.display_symbol(symbol);
        self.lines.push(format!("extra   {symbol}"));
    }

    fn trace_reduce(&mut self, production: ProductionId, state: StateId) {
        let production = self.table.display_production(production, None);
        self.lines.push(format!("reduce  {production} -> {state}"));
    }

    fn trace_fork(&mut self, count: usize) {
        if self.verbose() {
            self.lines.push(format!("fork    {count} ways"));
        }
    }

    fn trace_merge(&mut self, position: usize) {
        if self.verbose() {
            self.lines.push(format!("merge   @{position}"));
        }
    }

    fn trace_limit(&mut self, dropped: usize) {
        self.lines.push(format!("limit   dropped {dropped}"));
    }

    fn trace_skip(&mut self, symbol: Symbol, start: usize, len: usize) {
        let token = self.token(symbol, start, len);
        self.lines.push(format!("skip    {token} @{start}"));
    }

    fn trace_recover(&mut self, popped: usize, skipped: usize, state: StateId) {
        self.lines
            .push(format!("recover pop {popped}, skip {skipped} -> {state}"));
    }

    fn trace_reuse(&mut self, symbol: Symbol, start: usize, len: usize) {
        if self.verbose() {
            let token = self.token(symbol, start, len);
            self.lines.push(format!("reuse   {token} @{start}"));
        }
    }

    fn trace_accept(&mut self) {
        self.lines.push("accept".to_string());
    }
}
