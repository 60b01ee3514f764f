//! Swizzle simplification.

use alloc::vec::Vec;

use glopt_ir::{visit, Rvalue, Swizzle, SwizzleMask, Unit, VarTable};

use crate::{
    eval,
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Composes nested swizzles, drops identity swizzles and evaluates swizzles
/// of constants.
#[derive(Debug)]
pub struct OptimizeSwizzles;

impl Pass for OptimizeSwizzles {
    fn id(&self) -> PassId {
        PassId::OptimizeSwizzles
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let vars = &unit.vars;
        visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let Rvalue::Swizzle(s) = rv else {
                return false;
            };
            match simplify(s, vars) {
                Some(new) => {
                    *rv = new;
                    true
                }
                None => false,
            }
        })
    }
}

fn simplify(s: &Swizzle, vars: &VarTable) -> Option<Rvalue> {
    if let Some(c) = s.val.as_constant() {
        return eval::swizzle_constant(c, &s.mask).map(Rvalue::Constant);
    }
    if let Rvalue::Swizzle(inner) = &s.val {
        let composed: Vec<u8> = s
            .mask
            .iter()
            .map(|i| inner.mask.get(i as usize))
            .collect::<Option<_>>()?;
        return Some(Rvalue::swizzle(inner.val.clone(), SwizzleMask::new(&composed)?));
    }
    let ty = s.val.ty(vars);
    let n = ty.vector_elements();
    if (ty.is_scalar() || ty.is_vector()) && s.mask.is_identity(n) {
        return Some(s.val.clone());
    }
    None
}
