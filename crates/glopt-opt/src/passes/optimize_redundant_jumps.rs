//! Redundant jump removal.

use glopt_ir::{visit, LoopJump, Statement, Unit};

use super::lower_jumps::strip_trailing;
use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Removes a `continue` ending a loop body and a `return;` ending a void
/// function. Jumps nested in branches are left to `lower_jumps`.
#[derive(Debug)]
pub struct OptimizeRedundantJumps;

impl Pass for OptimizeRedundantJumps {
    fn id(&self) -> PassId {
        PassId::OptimizeRedundantJumps
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let cont = Statement::LoopJump(LoopJump::Continue);
        let ret = Statement::Return(None);

        let mut changed = false;
        for item in unit.items.iter_mut() {
            let Statement::Function(f) = item else {
                continue;
            };
            for sig in f.signatures.iter_mut() {
                changed |= visit::rewrite_statement_lists(&mut sig.body, &mut |list| {
                    let mut changed = false;
                    for stmt in list.iter_mut() {
                        if let Statement::Loop(l) = stmt {
                            changed |= strip_trailing(&mut l.body, &cont, false);
                        }
                    }
                    changed
                });
                if sig.return_type.is_void() {
                    changed |= strip_trailing(&mut sig.body, &ret, false);
                }
            }
        }
        changed
    }
}
