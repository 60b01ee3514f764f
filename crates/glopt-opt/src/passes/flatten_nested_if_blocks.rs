//! Merge directly nested `if`s into one.

use core::mem;

use glopt_ir::{visit, Constant, ExprOp, Rvalue, Statement, Type, Unit};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// `if (a) { if (b) { X } }` without `else` branches becomes
/// `if (a && b) { X }`.
#[derive(Debug)]
pub struct FlattenNestedIfBlocks;

impl Pass for FlattenNestedIfBlocks {
    fn id(&self) -> PassId {
        PassId::FlattenNestedIfBlocks
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        visit::rewrite_statement_lists(&mut unit.items, &mut |stmts| {
            let mut changed = false;
            for stmt in stmts.iter_mut() {
                let Statement::If(outer) = stmt else { continue };
                if !outer.else_body.is_empty() || outer.then_body.len() != 1 {
                    continue;
                }
                let Some(Statement::If(inner)) = outer.then_body.first_mut() else {
                    continue;
                };
                if !inner.else_body.is_empty() {
                    continue;
                }
                let inner_cond = take_condition(&mut inner.condition);
                let body = mem::take(&mut inner.then_body);
                let outer_cond = take_condition(&mut outer.condition);
                outer.condition =
                    Rvalue::binop(ExprOp::LogicAnd, Type::BOOL, outer_cond, inner_cond);
                outer.then_body = body;
                changed = true;
            }
            changed
        })
    }
}

fn take_condition(cond: &mut Rvalue) -> Rvalue {
    mem::replace(cond, Rvalue::constant(Constant::bool(true)))
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use glopt_ir::{If, StorageMode};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_nested_ifs_merged() {
        let mut unit = Unit::new();
        let a = local(&mut unit, "a", Type::BOOL);
        let b = local(&mut unit, "b", Type::BOOL);
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![Statement::If(If {
                condition: Rvalue::var(a),
                then_body: vec![Statement::If(If {
                    condition: Rvalue::var(b),
                    then_body: vec![assign(o, float(1.0))],
                    else_body: Vec::new(),
                })],
                else_body: Vec::new(),
            })],
        );
        assert!(run(&FlattenNestedIfBlocks, &mut unit));
        assert_eq!(
            main_body(&unit),
            &vec![Statement::If(If {
                condition: Rvalue::binop(
                    ExprOp::LogicAnd,
                    Type::BOOL,
                    Rvalue::var(a),
                    Rvalue::var(b)
                ),
                then_body: vec![assign(o, float(1.0))],
                else_body: Vec::new(),
            })]
        );
        assert!(!run(&FlattenNestedIfBlocks, &mut unit));
    }
}
