//! Base type conversions.

use alloc::format;

use glopt_ir::{BaseType, ExprOp, Rvalue, Type};

use super::{expr::folded, Lowerer};
use crate::{
    error::{GlslError, GlslResult},
    types::implicitly_converts,
};

/// Single conversion operator between two base types.
pub(super) fn conversion_op(from: BaseType, to: BaseType) -> Option<ExprOp> {
    use BaseType::*;
    use ExprOp::*;

    let op = match (from, to) {
        (Float, Int) => F2i,
        (Float, UInt) => F2u,
        (Float, Bool) => F2b,
        (Float, Double) => F2d,
        (Int, Float) => I2f,
        (Int, Bool) => I2b,
        (Int, UInt) => I2u,
        (Int, Double) => I2d,
        (UInt, Float) => U2f,
        (UInt, Int) => U2i,
        (UInt, Double) => U2d,
        (Bool, Float) => B2f,
        (Bool, Int) => B2i,
        (Double, Float) => D2f,
        (Double, Int) => D2i,
        (Double, UInt) => D2u,
        (Double, Bool) => D2b,
        _ => return None,
    };
    Some(op)
}

impl Lowerer<'_> {
    /// Explicit conversion of every component of `value` to `to`.
    pub(super) fn convert(&self, value: Rvalue, to: BaseType) -> GlslResult<Rvalue> {
        let ty = self.ty(&value);
        let from = ty.base_type().ok_or_else(|| {
            GlslError::type_error(format!("cannot convert {} to {}", ty.name(), to.scalar_name()))
        })?;
        if from == to {
            return Ok(value);
        }
        let target = ty.with_base(to).ok_or_else(|| {
            GlslError::type_error(format!("cannot convert {} to {}", ty.name(), to.scalar_name()))
        })?;
        match conversion_op(from, to) {
            Some(op) => Ok(folded(Rvalue::unop(op, target, value))),
            // uint <-> bool and bool -> double go through int.
            None => {
                let via = self.convert(value, BaseType::Int)?;
                self.convert(via, to)
            }
        }
    }

    /// Implicit conversion of `value` to `ty`.
    pub(super) fn coerce(&self, value: Rvalue, ty: &Type) -> GlslResult<Rvalue> {
        let from = self.ty(&value);
        if from == *ty {
            return Ok(value);
        }
        if let (Some(a), Some(b)) = (from.base_type(), ty.base_type()) {
            if implicitly_converts(a, b) && from.with_base(b).as_ref() == Some(ty) {
                return self.convert(value, b);
            }
        }
        Err(GlslError::type_error(format!(
            "cannot convert {} to {}",
            from.name(),
            ty.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use glopt_ir::{Constant, ShaderStage, Target};

    use super::*;

    #[test]
    fn test_conversion_ops() {
        assert_eq!(conversion_op(BaseType::Int, BaseType::Float), Some(ExprOp::I2f));
        assert_eq!(conversion_op(BaseType::Double, BaseType::Bool), Some(ExprOp::D2b));
        assert_eq!(conversion_op(BaseType::UInt, BaseType::Bool), None);
    }

    #[test]
    fn test_convert_folds_constants() {
        let target = Target::new(130, ShaderStage::Fragment);
        let lowerer = Lowerer::new(&target);
        let v = lowerer
            .convert(Rvalue::constant(Constant::int(3)), BaseType::Float)
            .unwrap();
        assert_eq!(v, Rvalue::constant(Constant::float(3.0)));
        let b = lowerer
            .convert(Rvalue::constant(Constant::uint(2)), BaseType::Bool)
            .unwrap();
        assert_eq!(b, Rvalue::constant(Constant::bool(true)));
    }

    #[test]
    fn test_coerce_is_implicit_only() {
        let target = Target::new(130, ShaderStage::Fragment);
        let lowerer = Lowerer::new(&target);
        assert!(lowerer
            .coerce(Rvalue::constant(Constant::int(1)), &Type::FLOAT)
            .is_ok());
        assert!(lowerer
            .coerce(Rvalue::constant(Constant::float(1.0)), &Type::INT)
            .is_err());
        assert!(lowerer
            .coerce(
                Rvalue::constant(Constant::float(1.0)),
                &Type::Vector(BaseType::Float, 2)
            )
            .is_err());
    }
}
