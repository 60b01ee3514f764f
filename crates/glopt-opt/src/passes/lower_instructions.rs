//! Instruction lowering: rewrite operators into simpler equivalents.

use core::f32::consts::{LN_2, LOG2_E};

use glopt_ir::{visit, BaseType, Constant, ExprOp, Expression, Rvalue, Unit, VarTable};

use crate::{
    options::LoweringFlags,
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

/// Applies the lowerings enabled in [`LoweringFlags`]:
/// - `a - b` to `a + -b`
/// - float and double `a / b` to `a * rcp(b)`
/// - `exp(x)` to `exp2(x * log2(e))` and `log(x)` to `log2(x) * ln(2)`
/// - `pow(x, y)` to `exp2(log2(x) * y)`
/// - `mod(x, y)` to `x - y * floor(x / y)`
/// - `saturate(x)` to `min(max(x, 0), 1)`
///
/// The remaining flags have no rewrite here.
#[derive(Debug)]
pub struct LowerInstructions;

impl Pass for LowerInstructions {
    fn id(&self) -> PassId {
        PassId::LowerInstructions
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let flags = match ctx.args {
            PassArgs::LowerInstructions(flags) => flags,
            _ => &ctx.options.lowering,
        };
        let vars = &unit.vars;
        visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let lowered = match rv {
                Rvalue::Expression(e) => lower(e, flags, vars),
                _ => None,
            };
            match lowered {
                Some(new) => {
                    *rv = new;
                    true
                }
                None => false,
            }
        })
    }
}

fn float_scalar(base: BaseType, v: f32) -> Option<Rvalue> {
    match base {
        BaseType::Float => Some(Rvalue::constant(Constant::float(v))),
        _ => None,
    }
}

fn lower(e: &Expression, flags: &LoweringFlags, vars: &VarTable) -> Option<Rvalue> {
    use ExprOp::*;

    let base = e.ty.base_type()?;
    let ops = &e.operands;
    match e.op {
        Sub if flags.sub_to_add_neg => {
            let b_ty = ops[1].ty(vars);
            Some(Rvalue::binop(
                Add,
                e.ty.clone(),
                ops[0].clone(),
                Rvalue::unop(Neg, b_ty, ops[1].clone()),
            ))
        }
        Div if (base == BaseType::Float && flags.fdiv_to_mul_rcp)
            || (base == BaseType::Double && flags.ddiv_to_mul_rcp) =>
        {
            let b_ty = ops[1].ty(vars);
            Some(Rvalue::binop(
                Mul,
                e.ty.clone(),
                ops[0].clone(),
                Rvalue::unop(Rcp, b_ty, ops[1].clone()),
            ))
        }
        Exp if flags.exp_to_exp2 => {
            let scaled = Rvalue::binop(Mul, e.ty.clone(), ops[0].clone(), float_scalar(base, LOG2_E)?);
            Some(Rvalue::unop(Exp2, e.ty.clone(), scaled))
        }
        Log if flags.log_to_log2 => Some(Rvalue::binop(
            Mul,
            e.ty.clone(),
            Rvalue::unop(Log2, e.ty.clone(), ops[0].clone()),
            float_scalar(base, LN_2)?,
        )),
        Pow if flags.pow_to_exp2 && base == BaseType::Float => {
            let log = Rvalue::unop(Log2, ops[0].ty(vars), ops[0].clone());
            Some(Rvalue::unop(
                Exp2,
                e.ty.clone(),
                Rvalue::binop(Mul, e.ty.clone(), log, ops[1].clone()),
            ))
        }
        Mod if flags.mod_to_floor && base.is_float() => {
            let (x, y) = (ops[0].clone(), ops[1].clone());
            let quotient = Rvalue::binop(Div, e.ty.clone(), x.clone(), y.clone());
            let floor = Rvalue::unop(Floor, e.ty.clone(), quotient);
            let product = Rvalue::binop(Mul, e.ty.clone(), y, floor);
            Some(Rvalue::binop(Sub, e.ty.clone(), x, product))
        }
        Saturate if flags.sat_to_clamp && base.is_float() => {
            let zero = Rvalue::constant(Constant::zero(glopt_ir::Type::Scalar(base))?);
            let one = Rvalue::constant(Constant::from_scalars(
                glopt_ir::Type::Scalar(base),
                &[glopt_ir::ScalarValue::Int(1)],
            )?);
            let lower_bound = Rvalue::binop(Max, e.ty.clone(), ops[0].clone(), zero);
            Some(Rvalue::binop(Min, e.ty.clone(), lower_bound, one))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    fn only(flags: impl FnOnce(&mut LoweringFlags)) -> PassArgs {
        let mut f = LoweringFlags::none();
        flags(&mut f);
        PassArgs::LowerInstructions(f)
    }

    #[test]
    fn test_sub_to_add_neg() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![assign(
                o,
                Rvalue::binop(ExprOp::Sub, Type::FLOAT, Rvalue::var(x), float(1.0)),
            )],
        );
        let args = only(|f| f.sub_to_add_neg = true);
        assert!(run_with(&LowerInstructions, &mut unit, args.clone()));
        assert_eq!(
            main_body(&unit)[0],
            assign(
                o,
                add(
                    Type::FLOAT,
                    Rvalue::var(x),
                    Rvalue::unop(ExprOp::Neg, Type::FLOAT, float(1.0))
                )
            )
        );
        assert!(!run_with(&LowerInstructions, &mut unit, args));
    }

    #[test]
    fn test_integer_division_untouched_by_fdiv() {
        let mut unit = Unit::new();
        let i = local(&mut unit, "i", Type::INT);
        push_function(
            &mut unit,
            "main",
            vec![assign(
                i,
                Rvalue::binop(ExprOp::Div, Type::INT, Rvalue::var(i), int(2)),
            )],
        );
        assert!(!run_with(
            &LowerInstructions,
            &mut unit,
            only(|f| f.set_div_to_mul_rcp(true))
        ));
    }

    #[test]
    fn test_mod_to_floor_shape() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![assign(
                o,
                Rvalue::binop(ExprOp::Mod, Type::FLOAT, Rvalue::var(x), float(3.0)),
            )],
        );
        assert!(run_with(
            &LowerInstructions,
            &mut unit,
            only(|f| f.mod_to_floor = true)
        ));
        let rhs = &main_body(&unit)[0].as_assign().unwrap().rhs;
        let e = rhs.as_expression().unwrap();
        assert_eq!(e.op, ExprOp::Sub);
        assert_eq!(e.operands[1].as_expression().unwrap().op, ExprOp::Mul);
    }
}
