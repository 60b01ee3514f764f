//! Loops.
//!
//! A loop with a single leading exit test and a single induction variable
//! prints as a `for` header; the init assignment and declaration preceding
//! it, the exit test and the update fold into the header. Any other loop
//! prints as `while (true)`.

use alloc::collections::BTreeSet;

use glopt_ir::{InductionVariable, Loop, LoopState, Statement, Terminator};

use super::Printer;

impl Printer<'_> {
    pub(super) fn loop_stmt(&mut self, l: &Loop) {
        let loops = self.loops;
        match loops.get(l.id).and_then(canonical) {
            Some((term, iv)) => self.for_loop(l, term, iv),
            None => {
                self.push("while (true)\n");
                self.block(&l.body);
            }
        }
    }

    /// Positions in `list` absorbed by the `for` headers of its loops.
    pub(super) fn hoisted_into_loops(&self, list: &[Statement]) -> BTreeSet<usize> {
        let mut hoisted = BTreeSet::new();
        for stmt in list {
            let Statement::Loop(l) = stmt else {
                continue;
            };
            let Some((_, iv)) = self.loops.get(l.id).and_then(canonical) else {
                continue;
            };
            if iv.init.is_some() {
                hoisted.extend(iv.init_index);
            }
            if iv.hoistable_declaration {
                hoisted.extend(iv.declaration_index);
            }
        }
        hoisted
    }

    fn for_loop(&mut self, l: &Loop, term: &Terminator, iv: &InductionVariable) {
        let unit = self.unit;
        self.push("for (");
        if let Some(init) = &iv.init {
            if iv.hoistable_declaration {
                self.push(&unit.vars.ty(iv.var).name());
                self.push(" ");
            }
            let name = self.ctx.name(iv.var, &unit.vars);
            self.push(&name);
            self.push(" = ");
            self.constant(init);
        }
        self.push("; ");
        self.negated_condition(&term.condition);
        self.push("; ");
        match l.body.get(iv.update_index) {
            Some(Statement::Assign(a)) => self.assignment(a),
            _ => self.unprintable("loop update away from its recorded position"),
        }
        self.push(")\n");
        self.block_except(&l.body, &[term.index, iv.update_index]);
    }
}

/// Exit test and induction variable of a loop printable as `for`.
fn canonical(state: &LoopState) -> Option<(&Terminator, &InductionVariable)> {
    match (state.terminators.as_slice(), state.induction_variables.as_slice()) {
        ([term], [iv]) => Some((term, iv)),
        _ => None,
    }
}
