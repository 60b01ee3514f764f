//! Invariance propagation.

use alloc::vec::Vec;

use glopt_ir::{visit, Statement, Unit, VarId, VarTable};

use super::is_plain_storage;
use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Marks the temporaries feeding an `invariant` or `precise` variable with
/// the same decoration, so their computation is not reordered either.
#[derive(Debug)]
pub struct PropagateInvariance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Invariant,
    Precise,
}

impl Pass for PropagateInvariance {
    fn id(&self) -> PassId {
        PassId::PropagateInvariance
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let mut marks: Vec<(VarId, Mark)> = Vec::new();
        visit::walk_statements(&unit.items, &mut |stmt| {
            let Statement::Assign(a) = stmt else {
                return;
            };
            let Some(dest) = a.lhs.root_var() else {
                return;
            };
            for mark in dest_marks(dest, &unit.vars) {
                for rv in visit::statement_rvalues(stmt) {
                    visit::walk_rvalue(rv, &mut |node| {
                        if let Some(v) = node.as_var() {
                            if v != dest {
                                marks.push((v, mark));
                            }
                        }
                    });
                }
            }
        });

        let mut changed = false;
        for (v, mark) in marks {
            let Some(var) = unit.vars.get_mut(v) else {
                continue;
            };
            if !is_plain_storage(var.mode()) {
                continue;
            }
            let flag = match mark {
                Mark::Invariant => &mut var.decorations.invariant,
                Mark::Precise => &mut var.decorations.precise,
            };
            if !*flag {
                *flag = true;
                changed = true;
            }
        }
        changed
    }
}

fn dest_marks(dest: VarId, vars: &VarTable) -> Vec<Mark> {
    let mut out = Vec::new();
    if let Some(var) = vars.get(dest) {
        if var.decorations.invariant {
            out.push(Mark::Invariant);
        }
        if var.decorations.precise {
            out.push(Mark::Precise);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{Rvalue, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_temporaries_inherit_invariance() {
        let mut unit = Unit::new();
        let t = local(&mut unit, "t", Type::FLOAT);
        let u = var(&mut unit, "u", Type::FLOAT, StorageMode::Uniform);
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        unit.vars.get_mut(o).unwrap().decorations.invariant = true;
        push_function(
            &mut unit,
            "main",
            vec![
                assign(t, Rvalue::var(u)),
                assign(o, add(Type::FLOAT, Rvalue::var(t), float(1.0))),
            ],
        );
        assert!(run(&PropagateInvariance, &mut unit));
        assert!(unit.vars.get(t).unwrap().decorations.invariant);
        assert!(!unit.vars.get(u).unwrap().decorations.invariant);
        assert!(!unit.vars.get(t).unwrap().decorations.explicit_invariant);
        assert!(!run(&PropagateInvariance, &mut unit));
    }
}
