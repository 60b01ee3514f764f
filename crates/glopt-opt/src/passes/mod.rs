//! Built-in pass implementations.
//!
//! Each pass rewrites the unit in place and reports whether it changed
//! anything. Passes only use information local to the unit; none of them
//! depends on another pass having run first.

mod algebraic;
mod conditional_discard;
mod constant_folding;
mod constant_propagation;
mod constant_variable;
mod dead_code;
mod dead_code_local;
mod dead_functions;
mod flatten_nested_if_blocks;
mod if_simplification;
mod lower_instructions;
mod lower_jumps;
mod lower_noise;
mod lower_texture_projection;
mod lower_vector_insert;
mod optimize_redundant_jumps;
mod optimize_swizzles;
mod propagate_invariance;
mod unroll_loops;
mod vec_index_to_swizzle;

#[cfg(test)]
pub(crate) mod test_util;

pub use algebraic::Algebraic;
pub use conditional_discard::ConditionalDiscard;
pub use constant_folding::ConstantFolding;
pub use constant_propagation::ConstantPropagation;
pub use constant_variable::{ConstantVariable, ConstantVariableUnlinked};
pub use dead_code::{DeadCode, DeadCodeUnlinked};
pub use dead_code_local::DeadCodeLocal;
pub use dead_functions::DeadFunctions;
pub use flatten_nested_if_blocks::FlattenNestedIfBlocks;
pub use if_simplification::IfSimplification;
pub use lower_instructions::LowerInstructions;
pub use lower_jumps::LowerJumps;
pub use lower_noise::LowerNoise;
pub use lower_texture_projection::LowerTextureProjection;
pub use lower_vector_insert::LowerVectorInsert;
pub use optimize_redundant_jumps::OptimizeRedundantJumps;
pub use optimize_swizzles::OptimizeSwizzles;
pub use propagate_invariance::PropagateInvariance;
pub use unroll_loops::UnrollLoops;
pub use vec_index_to_swizzle::VecIndexToSwizzle;

use alloc::{boxed::Box, collections::BTreeSet, vec, vec::Vec};

use glopt_ir::{
    visit, Constant, Deref, ExprOp, Rvalue, Statement, StorageMode, Type, Unit, VarId,
};

use crate::pass::Pass;

/// Every built-in pass.
pub fn builtins() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(LowerInstructions),
        Box::new(DeadFunctions),
        Box::new(PropagateInvariance),
        Box::new(IfSimplification),
        Box::new(FlattenNestedIfBlocks),
        Box::new(ConditionalDiscard),
        Box::new(DeadCode),
        Box::new(DeadCodeUnlinked),
        Box::new(DeadCodeLocal),
        Box::new(ConstantPropagation),
        Box::new(ConstantVariable),
        Box::new(ConstantVariableUnlinked),
        Box::new(ConstantFolding),
        Box::new(Algebraic),
        Box::new(LowerJumps),
        Box::new(VecIndexToSwizzle),
        Box::new(LowerVectorInsert),
        Box::new(OptimizeSwizzles),
        Box::new(OptimizeRedundantJumps),
        Box::new(UnrollLoops),
        Box::new(LowerTextureProjection),
        Box::new(LowerNoise),
    ]
}

/// Unqualified globals and locals, the only storage passes may drop or
/// rewrite freely.
pub(crate) fn is_plain_storage(mode: StorageMode) -> bool {
    matches!(mode, StorageMode::Auto | StorageMode::Temporary)
}

/// Variables passed by reference to a user function, which may write them
/// through `out` parameters.
pub(crate) fn call_argument_roots(stmts: &[Statement]) -> BTreeSet<VarId> {
    let mut out = BTreeSet::new();
    visit::walk_statements(stmts, &mut |stmt| {
        if let Statement::Call(c) = stmt {
            if !c.builtin {
                out.extend(c.args.iter().filter_map(Rvalue::root_var));
            }
        }
    });
    out
}

/// Variables declared inside function bodies.
pub(crate) fn function_locals(unit: &Unit) -> BTreeSet<VarId> {
    let mut out = BTreeSet::new();
    for f in unit.functions() {
        for sig in &f.signatures {
            visit::walk_statements(&sig.body, &mut |stmt| {
                if let Statement::Declare(v) = stmt {
                    out.insert(*v);
                }
            });
        }
    }
    out
}

/// Variables written anywhere in `stmts`, including through call arguments.
pub(crate) fn written_vars(stmts: &[Statement]) -> BTreeSet<VarId> {
    let mut out = call_argument_roots(stmts);
    visit::walk_statements(stmts, &mut |stmt| match stmt {
        Statement::Assign(a) => out.extend(a.lhs.root_var()),
        Statement::Call(c) => out.extend(c.return_deref.as_ref().and_then(Deref::root_var)),
        _ => {}
    });
    out
}

/// Logical negation of a boolean condition. Comparisons are inverted and
/// double negations removed instead of wrapping the condition.
pub(crate) fn negate(cond: Rvalue) -> Rvalue {
    match cond {
        Rvalue::Expression(mut e) if e.ty == Type::BOOL => {
            if e.op == ExprOp::LogicNot {
                return e.operands.remove(0);
            }
            match e.op.inverse_comparison() {
                Some(inv) => {
                    e.op = inv;
                    Rvalue::Expression(e)
                }
                None => Rvalue::unop(ExprOp::LogicNot, Type::BOOL, Rvalue::Expression(e)),
            }
        }
        Rvalue::Constant(c) if c.ty == Type::BOOL => Rvalue::constant(Constant::bool(c.is_zero())),
        other => Rvalue::unop(ExprOp::LogicNot, Type::BOOL, other),
    }
}
