//! Fold `if (c) discard;` into a conditional discard.

use glopt_ir::{visit, ExprOp, Rvalue, Statement, Type, Unit};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

#[derive(Debug)]
pub struct ConditionalDiscard;

impl Pass for ConditionalDiscard {
    fn id(&self) -> PassId {
        PassId::ConditionalDiscard
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        visit::rewrite_statement_lists(&mut unit.items, &mut |stmts| {
            let mut changed = false;
            for stmt in stmts.iter_mut() {
                let Statement::If(i) = stmt else { continue };
                if !i.else_body.is_empty() || i.then_body.len() != 1 {
                    continue;
                }
                let Statement::Discard(inner) = &i.then_body[0] else {
                    continue;
                };
                let condition = match inner {
                    None => i.condition.clone(),
                    Some(c) => Rvalue::binop(
                        ExprOp::LogicAnd,
                        Type::BOOL,
                        i.condition.clone(),
                        c.clone(),
                    ),
                };
                *stmt = Statement::Discard(Some(condition));
                changed = true;
            }
            changed
        })
    }
}
