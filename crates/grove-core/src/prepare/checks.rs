//! Whole-grammar checks on the flattened productions.

use crate::symbol::Symbol;
use crate::{GrammarError, GrammarModel};

pub(super) fn check(model: &GrammarModel) -> Result<(), GrammarError> {
    check_productive(model)?;
    check_unit_cycles(model)
}

/// Every nonterminal must derive at least one finite token string.
fn check_productive(model: &GrammarModel) -> Result<(), GrammarError> {
    let mut productive = vec![false; model.symbol_count()];
    productive[..model.terminal_count()].fill(true);
    let mut changed = true;
    while changed {
        changed = false;
        for p in model.productions() {
            if !productive[p.lhs.index()] && p.steps.iter().all(|s| productive[s.symbol.index()]) {
                productive[p.lhs.index()] = true;
                changed = true;
            }
        }
    }
    match model.nonterminals().find(|nt| !productive[nt.index()]) {
        Some(nt) => Err(GrammarError::NonProductive {
            rule: model.symbol(model.origin(nt)).name.clone(),
        }),
        None => Ok(()),
    }
}

fn nullable(model: &GrammarModel) -> Vec<bool> {
    let mut nullable = vec![false; model.symbol_count()];
    let mut changed = true;
    while changed {
        changed = false;
        for p in model.productions() {
            if !nullable[p.lhs.index()] && p.steps.iter().all(|s| nullable[s.symbol.index()]) {
                nullable[p.lhs.index()] = true;
                changed = true;
            }
        }
    }
    nullable
}

/// A nonterminal that derives itself through a chain of productions whose
/// other steps are all nullable makes the grammar infinitely ambiguous.
fn check_unit_cycles(model: &GrammarModel) -> Result<(), GrammarError> {
    let nullable = nullable(model);
    let range = model.nonterminal_range();
    let mut edges: Vec<Vec<Symbol>> = vec![Vec::new(); range.len()];
    for p in model.productions() {
        for (i, step) in p.steps.iter().enumerate() {
            if !range.contains(&step.symbol.index()) {
                continue;
            }
            let others_nullable = p
                .steps
                .iter()
                .enumerate()
                .all(|(j, s)| j == i || nullable[s.symbol.index()]);
            if others_nullable {
                edges[p.lhs.index() - range.start].push(step.symbol);
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }
    let mut marks = vec![Mark::New; range.len()];
    for root in 0..range.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // Iterative DFS: (node, next edge index).
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some(&(node, next)) = stack.last() {
            if let Some(&target) = edges[node].get(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let t = target.index() - range.start;
                match marks[t] {
                    Mark::Active => {
                        return Err(GrammarError::CyclicDerivation {
                            rule: model.symbol(model.origin(target)).name.clone(),
                        });
                    }
                    Mark::New => {
                        marks[t] = Mark::Active;
                        stack.push((t, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}
