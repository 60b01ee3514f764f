//! `if` simplification.

use alloc::vec::Vec;
use core::mem;

use glopt_ir::{visit, If, Statement, Unit};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
    passes::negate,
};

/// Splices the taken branch of an `if` with a constant condition, removes
/// `if`s with two empty branches, and turns `if (c) {} else { X }` into
/// `if (!c) { X }`.
#[derive(Debug)]
pub struct IfSimplification;

impl Pass for IfSimplification {
    fn id(&self) -> PassId {
        PassId::IfSimplification
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        visit::rewrite_statement_lists(&mut unit.items, &mut simplify_list)
    }
}

fn simplify_list(stmts: &mut Vec<Statement>) -> bool {
    if !stmts.iter().any(|s| matches!(s, Statement::If(_))) {
        return false;
    }
    let mut changed = false;
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in mem::take(stmts) {
        let Statement::If(mut i) = stmt else {
            out.push(stmt);
            continue;
        };
        if let Some(c) = i.condition.as_constant() {
            let taken = if c.is_zero() { i.else_body } else { i.then_body };
            out.extend(taken);
            changed = true;
        } else if i.then_body.is_empty() && i.else_body.is_empty() {
            changed = true;
        } else if i.then_body.is_empty() {
            out.push(Statement::If(If {
                condition: negate(i.condition),
                then_body: mem::take(&mut i.else_body),
                else_body: Vec::new(),
            }));
            changed = true;
        } else {
            out.push(Statement::If(i));
        }
    }
    *stmts = out;
    changed
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{Constant, ExprOp, Rvalue, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_constant_condition_spliced() {
        let mut unit = Unit::new();
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![Statement::If(If {
                condition: Rvalue::constant(Constant::bool(false)),
                then_body: vec![assign(o, float(1.0))],
                else_body: vec![assign(o, float(2.0))],
            })],
        );
        assert!(run(&IfSimplification, &mut unit));
        assert_eq!(main_body(&unit), &vec![assign(o, float(2.0))]);
    }

    #[test]
    fn test_empty_then_inverts_condition() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![Statement::If(If {
                condition: Rvalue::binop(ExprOp::Less, Type::BOOL, Rvalue::var(x), float(0.0)),
                then_body: vec![],
                else_body: vec![assign(o, float(2.0))],
            })],
        );
        assert!(run(&IfSimplification, &mut unit));
        assert_eq!(
            main_body(&unit),
            &vec![Statement::If(If {
                condition: Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(x), float(0.0)),
                then_body: vec![assign(o, float(2.0))],
                else_body: vec![],
            })]
        );
        assert!(!run(&IfSimplification, &mut unit));
    }
}
