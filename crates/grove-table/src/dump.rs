//! Human-readable table dump for debugging and snapshot tests.

use std::fmt::Write as _;

use crate::table::{Action, ParseTable, ProductionId};

pub(crate) fn dump(table: &ParseTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} states, {} productions, {} lex modes",
        table.name(),
        table.state_count(),
        table.productions().len(),
        table.lex().modes().len()
    );
    for (id, state) in table.states().iter().enumerate() {
        let _ = writeln!(out, "\nstate {id} (lex mode {})", state.lex_mode);
        for &(production, dot) in &state.kernel {
            let _ = writeln!(out, "  {}", table.display_production(production, Some(dot)));
        }
        for (symbol, actions) in &state.actions {
            let rendered: Vec<String> = actions.iter().map(format_action).collect();
            let _ = writeln!(
                out,
                "  {} => {}",
                table.display_symbol(*symbol),
                rendered.join(" | ")
            );
        }
        for &(symbol, target) in &state.gotos {
            let _ = writeln!(out, "  {} => goto {target}", table.display_symbol(symbol));
        }
    }
    out
}

fn format_action(action: &Action) -> String {
    match action {
        Action::Shift(state) => format!("shift {state}"),
        Action::ShiftExtra => "shift extra".to_string(),
        Action::Reduce(production) => format!("reduce {production}"),
        Action::Accept => "accept".to_string(),
    }
}

impl ParseTable {
    /// Render a production, optionally with an item dot: `expr → expr • '+' expr`.
    pub fn display_production(&self, id: ProductionId, dot: Option<usize>) -> String {
        let production = self.production(id);
        let mut out = format!("{} →", self.symbol_name(production.lhs));
        for (i, &symbol) in production.rhs.iter().enumerate() {
            if dot == Some(i) {
                out.push_str(" •");
            }
            out.push(' ');
            out.push_str(&self.display_symbol(symbol));
        }
        if dot == Some(production.rhs.len()) {
            out.push_str(" •");
        }
        out
    }
}
