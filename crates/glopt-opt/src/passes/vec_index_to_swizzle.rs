//! Constant vector indexing to swizzles.

use glopt_ir::{visit, Deref, Rvalue, Statement, SwizzleMask, Unit, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Rewrites `v[k]` with a constant `k` into `v.x`/`v.y`/... when `v` is a
/// vector. On the left-hand side of an assignment to a whole variable the
/// index becomes a write mask.
#[derive(Debug)]
pub struct VecIndexToSwizzle;

impl Pass for VecIndexToSwizzle {
    fn id(&self) -> PassId {
        PassId::VecIndexToSwizzle
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let vars = &unit.vars;
        let mut changed = visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let swizzled = match rv {
                Rvalue::Deref(Deref::Array { array, index }) => constant_component(array, index, vars)
                    .and_then(|k| SwizzleMask::new(&[k]))
                    .map(|mask| Rvalue::swizzle((**array).clone(), mask)),
                _ => None,
            };
            match swizzled {
                Some(new) => {
                    *rv = new;
                    true
                }
                None => false,
            }
        });

        for item in unit.items.iter_mut() {
            changed |= lower_lhs(core::slice::from_mut(item), vars);
        }
        changed
    }
}

/// Component index of `array[index]` when `array` is a vector and `index`
/// a constant in range.
fn constant_component(array: &Rvalue, index: &Rvalue, vars: &VarTable) -> Option<u8> {
    let ty = array.ty(vars);
    if !ty.is_vector() {
        return None;
    }
    let k = index.as_constant()?.get_int_component(0)?;
    let k = u8::try_from(k).ok()?;
    (k < ty.vector_elements()).then_some(k)
}

fn lower_lhs(stmts: &mut [Statement], vars: &VarTable) -> bool {
    let mut changed = false;
    for stmt in stmts.iter_mut() {
        if let Statement::Assign(a) = stmt {
            if a.write_mask != 0 {
                continue;
            }
            let target = match &a.lhs {
                Deref::Array { array, index } => array
                    .as_var()
                    .and_then(|v| Some((v, constant_component(array, index, vars)?))),
                _ => None,
            };
            if let Some((v, k)) = target {
                a.lhs = Deref::Var(v);
                a.write_mask = 1 << k;
                changed = true;
            }
        }
        for body in visit::nested_bodies_mut(stmt) {
            changed |= lower_lhs(body, vars);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{Assignment, BaseType, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_read_and_write_index() {
        let mut unit = Unit::new();
        let v = local(&mut unit, "v", Type::Vector(BaseType::Float, 4));
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![
                Statement::assign(Deref::array(Rvalue::var(v), int(2)), float(1.0)),
                assign(o, Rvalue::Deref(Deref::array(Rvalue::var(v), int(1)))),
            ],
        );
        assert!(run(&VecIndexToSwizzle, &mut unit));
        let body = main_body(&unit);
        assert_eq!(
            body[0],
            Statement::Assign(Assignment::masked(Deref::Var(v), float(1.0), 0b0100))
        );
        assert_eq!(
            body[1],
            assign(
                o,
                Rvalue::swizzle(Rvalue::var(v), SwizzleMask::new(&[1]).unwrap())
            )
        );
        assert!(!run(&VecIndexToSwizzle, &mut unit));
    }

    #[test]
    fn test_array_index_untouched() {
        let mut unit = Unit::new();
        let a = local(&mut unit, "a", Type::array(Type::FLOAT, 3));
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![assign(o, Rvalue::Deref(Deref::array(Rvalue::var(a), int(1))))],
        );
        assert!(!run(&VecIndexToSwizzle, &mut unit));
    }
}
