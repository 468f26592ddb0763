//! Grammar validation and flattening.
//!
//! Passes, in order:
//! 1. `extract`: index rules, classify token rules, lower rule bodies with
//!    every token replaced by a terminal slot
//! 2. `flatten`: number symbols, expand rule bodies into productions
//! 3. `checks`: productivity and unit-cycle detection

mod checks;
mod extract;
mod flatten;
mod token;


use crate::{Grammar, GrammarError, GrammarModel};

impl Grammar {
    /// Validate the grammar and flatten it into productions.
    pub fn validate(&self) -> Result<GrammarModel, GrammarError> {
        let extracted = extract::extract(self)?;
        let model = flatten::flatten(self, extracted)?;
        checks::check(&model)?;
        Ok(model)
    }
}
