//! Constant-variable propagation: variables assigned exactly once with a
//! constant become constants.

use alloc::collections::{BTreeMap, BTreeSet};

use glopt_ir::{visit, Constant, Rvalue, Statement, Unit, VarId};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
    passes::{call_argument_roots, function_locals, is_plain_storage},
};

/// Whole-program variant: every unqualified global and local is a candidate.
#[derive(Debug)]
pub struct ConstantVariable;

/// Single-shader variant: only variables declared inside function bodies
/// are candidates.
#[derive(Debug)]
pub struct ConstantVariableUnlinked;

impl Pass for ConstantVariable {
    fn id(&self) -> PassId {
        PassId::ConstantVariable
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let candidates: BTreeSet<VarId> = unit
            .vars
            .iter()
            .filter(|(_, v)| is_plain_storage(v.mode()))
            .map(|(id, _)| id)
            .collect();
        promote(unit, &candidates)
    }
}

impl Pass for ConstantVariableUnlinked {
    fn id(&self) -> PassId {
        PassId::ConstantVariableUnlinked
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let candidates: BTreeSet<VarId> = function_locals(unit)
            .into_iter()
            .filter(|v| is_plain_storage(unit.vars.mode(*v)))
            .collect();
        promote(unit, &candidates)
    }
}

/// What is known about the stores to one variable.
enum Stores {
    /// Exactly one store, of this constant
    Constant(Constant),
    /// Anything else
    Varying,
}

fn promote(unit: &mut Unit, candidates: &BTreeSet<VarId>) -> bool {
    let by_reference = call_argument_roots(&unit.items);
    let mut stores: BTreeMap<VarId, Stores> = BTreeMap::new();
    let vars = &unit.vars;
    visit::walk_statements(&unit.items, &mut |stmt| {
        let (root, value) = match stmt {
            Statement::Assign(a) => (
                a.lhs.root_var(),
                a.whole_var(vars).and(a.rhs.as_constant().cloned()),
            ),
            Statement::Call(c) => (c.return_deref.as_ref().and_then(|d| d.root_var()), None),
            _ => return,
        };
        let Some(root) = root else { return };
        let next = match (stores.get(&root), value) {
            (None, Some(c)) => Stores::Constant(c),
            _ => Stores::Varying,
        };
        stores.insert(root, next);
    });

    let mut changed = false;
    let mut known: BTreeMap<VarId, Constant> = BTreeMap::new();
    for &v in candidates {
        if by_reference.contains(&v) || unit.vars.ty(v).is_sampler() {
            continue;
        }
        let value = match stores.remove(&v) {
            Some(Stores::Constant(c)) => c,
            Some(Stores::Varying) => continue,
            None => match unit.vars.get(v).and_then(|var| var.constant_value.clone()) {
                Some(c) => c,
                None => continue,
            },
        };
        if let Some(var) = unit.vars.get_mut(v) {
            if var.constant_value.as_ref() != Some(&value) {
                var.constant_value = Some(value.clone());
                changed = true;
            }
        }
        known.insert(v, value);
    }
    if known.is_empty() {
        return changed;
    }
    changed
        | visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            match rv.as_var().and_then(|v| known.get(&v)) {
                Some(c) => {
                    *rv = Rvalue::constant(c.clone());
                    true
                }
                None => false,
            }
        })
}
