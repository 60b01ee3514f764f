//! `vector_insert` lowering.

use alloc::vec::Vec;

use glopt_ir::{visit, Assignment, Deref, ExprOp, Rvalue, Statement, Unit, VarId, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

/// Splits `a = vector_insert(b, c, k)` into `a = b; a.k = c;`.
///
/// A non-constant `k` becomes an indexed store `a[k] = c` when the
/// non-constant lowering is requested; otherwise such inserts are kept.
#[derive(Debug)]
pub struct LowerVectorInsert;

impl Pass for LowerVectorInsert {
    fn id(&self) -> PassId {
        PassId::LowerVectorInsert
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let nonconstant = match ctx.args {
            PassArgs::LowerVectorInsert {
                lower_nonconstant_index,
            } => *lower_nonconstant_index,
            _ => ctx.options.lower_vector_insert.lower_nonconstant_index,
        };
        let vars = &unit.vars;
        let mut changed = false;
        for item in unit.items.iter_mut() {
            if let Statement::Function(f) = item {
                for sig in f.signatures.iter_mut() {
                    changed |= visit::rewrite_statement_lists(&mut sig.body, &mut |list| {
                        split_inserts(list, vars, nonconstant)
                    });
                }
            }
        }
        changed
    }
}

fn split_inserts(list: &mut Vec<Statement>, vars: &VarTable, nonconstant: bool) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < list.len() {
        let replacement = match &list[i] {
            Statement::Assign(a) => lower(a, vars, nonconstant),
            _ => None,
        };
        match replacement {
            Some(stmts) => {
                let n = stmts.len();
                list.splice(i..=i, stmts);
                i += n;
                changed = true;
            }
            None => i += 1,
        }
    }
    changed
}

fn lower(a: &Assignment, vars: &VarTable, nonconstant: bool) -> Option<Vec<Statement>> {
    if a.condition.is_some() || a.write_mask != 0 {
        return None;
    }
    let dest: VarId = a.lhs.as_var()?;
    let e = a.rhs.as_expression()?;
    if e.op != ExprOp::VectorInsert || !vars.ty(dest).is_vector() {
        return None;
    }
    let (base, value, index) = (&e.operands[0], &e.operands[1], &e.operands[2]);

    let store = match index.as_constant().and_then(|c| c.get_int_component(0)) {
        Some(k) if (0..vars.ty(dest).vector_elements() as i64).contains(&k) => Statement::Assign(
            Assignment::masked(Deref::Var(dest), value.clone(), 1 << k),
        ),
        Some(_) => return None,
        None if nonconstant => Statement::assign(
            Deref::array(Rvalue::var(dest), index.clone()),
            value.clone(),
        ),
        None => return None,
    };

    let mut out = Vec::with_capacity(2);
    if base.as_var() != Some(dest) {
        out.push(Statement::assign(Deref::Var(dest), base.clone()));
    }
    out.push(store);
    Some(out)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{BaseType, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    fn insert(base: Rvalue, value: Rvalue, index: Rvalue) -> Rvalue {
        Rvalue::expr(
            ExprOp::VectorInsert,
            Type::Vector(BaseType::Float, 3),
            vec![base, value, index],
        )
    }

    #[test]
    fn test_constant_index_splits() {
        let mut unit = Unit::new();
        let vec3 = Type::Vector(BaseType::Float, 3);
        let a = var(&mut unit, "a", vec3.clone(), StorageMode::ShaderOut);
        let b = local(&mut unit, "b", vec3);
        push_function(
            &mut unit,
            "main",
            vec![assign(a, insert(Rvalue::var(b), float(2.0), int(1)))],
        );
        assert!(run(&LowerVectorInsert, &mut unit));
        assert_eq!(
            main_body(&unit),
            &vec![
                assign(a, Rvalue::var(b)),
                Statement::Assign(Assignment::masked(Deref::Var(a), float(2.0), 0b010)),
            ]
        );
    }

    #[test]
    fn test_nonconstant_index_needs_option() {
        let mut unit = Unit::new();
        let a = local(&mut unit, "a", Type::Vector(BaseType::Float, 3));
        let i = local(&mut unit, "i", Type::INT);
        push_function(
            &mut unit,
            "main",
            vec![assign(a, insert(Rvalue::var(a), float(2.0), Rvalue::var(i)))],
        );
        assert!(!run(&LowerVectorInsert, &mut unit));
        let args = PassArgs::LowerVectorInsert {
            lower_nonconstant_index: true,
        };
        assert!(run_with(&LowerVectorInsert, &mut unit, args));
        assert_eq!(
            main_body(&unit),
            &vec![Statement::assign(
                Deref::array(Rvalue::var(a), Rvalue::var(i)),
                float(2.0)
            )]
        );
    }
}
