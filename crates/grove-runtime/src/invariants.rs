//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use std::rc::Rc;

use grove_table::{ParseTable, StateId, Symbol};

use crate::stack::{StackNode, Version};
use crate::subtree::Subtree;

impl StackNode {
    pub(crate) fn ensure_subtree(&self) -> &Subtree {
        self.subtree.as_ref().unwrap_or_else(|| {
            panic!(
                "Stack: reduction reached the bottom entry in state {} \
                 (table production lengths must match the stack)",
                self.state
            )
        })
    }

    pub(crate) fn ensure_prev(&self) -> &Rc<StackNode> {
        self.prev.as_ref().unwrap_or_else(|| {
            panic!(
                "Stack: popped past the bottom entry in state {}",
                self.state
            )
        })
    }
}

pub(crate) fn ensure_goto(table: &ParseTable, state: StateId, nonterminal: Symbol) -> StateId {
    table.goto(state, nonterminal).unwrap_or_else(|| {
        panic!(
            "ParseTable: no goto from state {state} on {} \
             (every reduction must have a successor)",
            table.symbol_name(nonterminal)
        )
    })
}

pub(crate) fn ensure_finished(best: Option<Version>) -> Version {
    best.unwrap_or_else(|| {
        panic!("Parser: no version finished (error recovery must always accept at end of input)")
    })
}
