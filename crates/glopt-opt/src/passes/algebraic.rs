//! Algebraic simplification: arithmetic and logic identities.

use glopt_ir::{visit, Constant, ExprOp, Expression, Rvalue, Type, Unit, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

/// Applies identities such as `x + 0`, `x * 1`, `x * 0`, `-(-x)`,
/// `!(a < b)` and boolean short circuits with constant operands.
///
/// Without native integers, integer-typed expressions are left alone.
#[derive(Debug)]
pub struct Algebraic;

impl Pass for Algebraic {
    fn id(&self) -> PassId {
        PassId::Algebraic
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let native_integers = match ctx.args {
            PassArgs::Algebraic { native_integers } => *native_integers,
            _ => ctx.options.algebraic.native_integers,
        };
        let vars = &unit.vars;
        visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let replacement = match rv {
                Rvalue::Expression(e) if native_integers || !e.ty.is_integer() => {
                    simplify(e, vars)
                }
                _ => None,
            };
            match replacement {
                Some(r) => {
                    *rv = r;
                    true
                }
                None => false,
            }
        })
    }
}

fn constant_operand(e: &Expression, i: usize) -> Option<&Constant> {
    e.operands.get(i)?.as_constant().filter(|c| !c.ty.is_matrix())
}

/// Operand `i`, if it already has the type of the whole expression.
fn same_typed(e: &Expression, i: usize, vars: &VarTable) -> Option<Rvalue> {
    let op = e.operands.get(i)?;
    (op.ty(vars) == e.ty).then(|| op.clone())
}

fn simplify(e: &Expression, vars: &VarTable) -> Option<Rvalue> {
    use ExprOp::*;

    let zero = |i| constant_operand(e, i).map_or(false, Constant::is_zero);
    let one = |i| constant_operand(e, i).map_or(false, Constant::is_one);

    match e.op {
        Add if zero(0) => same_typed(e, 1, vars),
        Add if zero(1) => same_typed(e, 0, vars),
        Sub if zero(1) => same_typed(e, 0, vars),
        Mul if one(0) => same_typed(e, 1, vars),
        Mul if one(1) => same_typed(e, 0, vars),
        Mul if zero(0) || zero(1) => Constant::zero(e.ty.clone()).map(Rvalue::constant),
        Div if one(1) => same_typed(e, 0, vars),
        Neg | LogicNot => {
            let inner = e.operands[0].as_expression()?;
            if inner.op == e.op {
                return Some(inner.operands[0].clone());
            }
            if e.op == LogicNot && e.ty == Type::BOOL && inner.ty == Type::BOOL {
                let inv = inner.op.inverse_comparison()?;
                return Some(Rvalue::expr(inv, Type::BOOL, inner.operands.clone()));
            }
            None
        }
        LogicAnd if one(0) => same_typed(e, 1, vars),
        LogicAnd if one(1) => same_typed(e, 0, vars),
        LogicAnd if zero(0) || zero(1) => Some(Rvalue::constant(Constant::bool(false))),
        LogicOr if zero(0) => same_typed(e, 1, vars),
        LogicOr if zero(1) => same_typed(e, 0, vars),
        LogicOr if one(0) || one(1) => Some(Rvalue::constant(Constant::bool(true))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::BaseType;

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_identities() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let b = local(&mut unit, "b", Type::BOOL);
        let y = local(&mut unit, "y", Type::FLOAT);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(y, add(Type::FLOAT, Rvalue::var(x), float(0.0))),
                assign(
                    y,
                    Rvalue::binop(ExprOp::Mul, Type::FLOAT, float(1.0), Rvalue::var(x)),
                ),
                assign(
                    b,
                    Rvalue::unop(
                        ExprOp::LogicNot,
                        Type::BOOL,
                        Rvalue::binop(ExprOp::Less, Type::BOOL, Rvalue::var(x), float(1.0)),
                    ),
                ),
            ],
        );
        assert!(run(&Algebraic, &mut unit));
        let body = main_body(&unit);
        assert_eq!(body[0], assign(y, Rvalue::var(x)));
        assert_eq!(body[1], assign(y, Rvalue::var(x)));
        assert_eq!(
            body[2],
            assign(
                b,
                Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(x), float(1.0))
            )
        );
        assert!(!run(&Algebraic, &mut unit));
    }

    #[test]
    fn test_broadcast_identity_keeps_type() {
        // vec3 = float x + vec3(0): dropping the zero would change the type
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let v = local(&mut unit, "v", Type::Vector(BaseType::Float, 3));
        let zero3 = Constant::zero(Type::Vector(BaseType::Float, 3)).unwrap();
        push_function(
            &mut unit,
            "main",
            vec![assign(
                v,
                add(
                    Type::Vector(BaseType::Float, 3),
                    Rvalue::var(x),
                    Rvalue::constant(zero3),
                ),
            )],
        );
        assert!(!run(&Algebraic, &mut unit));
    }

    #[test]
    fn test_integer_rules_need_native_integers() {
        let mut unit = Unit::new();
        let i = local(&mut unit, "i", Type::INT);
        push_function(
            &mut unit,
            "main",
            vec![assign(i, add(Type::INT, Rvalue::var(i), int(0)))],
        );
        assert!(!run_with(
            &Algebraic,
            &mut unit,
            PassArgs::Algebraic {
                native_integers: false
            }
        ));
        assert!(run_with(
            &Algebraic,
            &mut unit,
            PassArgs::Algebraic {
                native_integers: true
            }
        ));
        assert_eq!(main_body(&unit)[0], assign(i, Rvalue::var(i)));
    }
}
