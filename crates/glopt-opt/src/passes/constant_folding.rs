//! Constant folding: replace expressions over constant operands by their
//! value.

use glopt_ir::{visit, Unit};

use crate::{
    eval,
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Folds expressions, swizzles and accesses whose operands are constants.
#[derive(Debug)]
pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn id(&self) -> PassId {
        PassId::ConstantFolding
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        visit::rewrite_all_rvalues(&mut unit.items, &mut eval::fold_node)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{ExprOp, Rvalue, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_folds_constant_subtrees_only() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let y = local(&mut unit, "y", Type::FLOAT);
        // y = 2 + 3 * x
        let rhs = add(
            Type::FLOAT,
            float(2.0),
            Rvalue::binop(ExprOp::Mul, Type::FLOAT, float(3.0), Rvalue::var(x)),
        );
        // x = 2 * 3
        let init = Rvalue::binop(ExprOp::Mul, Type::FLOAT, float(2.0), float(3.0));
        push_function(&mut unit, "main", vec![assign(x, init), assign(y, rhs.clone())]);

        assert!(run(&ConstantFolding, &mut unit));
        let body = main_body(&unit);
        assert_eq!(body[0], assign(x, float(6.0)));
        assert_eq!(body[1], assign(y, rhs));
        assert!(!run(&ConstantFolding, &mut unit));
    }
}
