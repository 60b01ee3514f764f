//! `noise*()` lowering.

use glopt_ir::{visit, Constant, ExprOp, Rvalue, Unit};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Replaces `noise` expressions by zero of the same type.
#[derive(Debug)]
pub struct LowerNoise;

impl Pass for LowerNoise {
    fn id(&self) -> PassId {
        PassId::LowerNoise
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let zero = match rv {
                Rvalue::Expression(e) if e.op == ExprOp::Noise => Constant::zero(e.ty.clone()),
                _ => None,
            };
            match zero {
                Some(c) => {
                    *rv = Rvalue::Constant(c);
                    true
                }
                None => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{BaseType, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_noise_becomes_zero() {
        let mut unit = Unit::new();
        let vec2 = Type::Vector(BaseType::Float, 2);
        let x = var(&mut unit, "x", Type::FLOAT, StorageMode::ShaderIn);
        let o = var(&mut unit, "o", vec2.clone(), StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![assign(
                o,
                Rvalue::unop(ExprOp::Noise, vec2.clone(), Rvalue::var(x)),
            )],
        );
        assert!(run(&LowerNoise, &mut unit));
        assert_eq!(
            main_body(&unit)[0],
            assign(o, Rvalue::constant(Constant::zero(vec2).unwrap()))
        );
    }
}
