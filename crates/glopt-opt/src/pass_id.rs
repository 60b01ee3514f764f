//! Pass identities and the fixed schedule.

use alloc::{string::String, vec::Vec};
use core::fmt;

use glopt_ir::ShaderStage;

use crate::options::{
    DeadCodeOptions, LowerIfToCondAssignOptions, LowerJumpsOptions, LowerVariableIndexOptions,
    LoweringFlags, OptimizationOptions,
};

/// Every schedulable rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PassId {
    LowerInstructions,
    FunctionInlining,
    DeadFunctions,
    StructureSplitting,
    PropagateInvariance,
    IfSimplification,
    FlattenNestedIfBlocks,
    ConditionalDiscard,
    CopyPropagationElements,
    FlipMatrices,
    Vectorize,
    DeadCode,
    DeadCodeUnlinked,
    DeadCodeLocal,
    TreeGrafting,
    ConstantPropagation,
    ConstantVariable,
    ConstantVariableUnlinked,
    ConstantFolding,
    MinmaxPrune,
    RebalanceTree,
    Algebraic,
    LowerJumps,
    VecIndexToSwizzle,
    LowerVectorInsert,
    OptimizeSwizzles,
    OptimizeSplitArrays,
    OptimizeRedundantJumps,
    UnrollLoops,
    LowerTextureProjection,
    LowerIfToCondAssign,
    MatOpToVec,
    VecIndexToCondAssign,
    LowerDiscard,
    LowerNoise,
    LowerVariableIndexToCondAssign,
    LowerQuadopVector,
}

impl PassId {
    /// All passes in declaration order.
    pub const ALL: [PassId; 37] = [
        PassId::LowerInstructions,
        PassId::FunctionInlining,
        PassId::DeadFunctions,
        PassId::StructureSplitting,
        PassId::PropagateInvariance,
        PassId::IfSimplification,
        PassId::FlattenNestedIfBlocks,
        PassId::ConditionalDiscard,
        PassId::CopyPropagationElements,
        PassId::FlipMatrices,
        PassId::Vectorize,
        PassId::DeadCode,
        PassId::DeadCodeUnlinked,
        PassId::DeadCodeLocal,
        PassId::TreeGrafting,
        PassId::ConstantPropagation,
        PassId::ConstantVariable,
        PassId::ConstantVariableUnlinked,
        PassId::ConstantFolding,
        PassId::MinmaxPrune,
        PassId::RebalanceTree,
        PassId::Algebraic,
        PassId::LowerJumps,
        PassId::VecIndexToSwizzle,
        PassId::LowerVectorInsert,
        PassId::OptimizeSwizzles,
        PassId::OptimizeSplitArrays,
        PassId::OptimizeRedundantJumps,
        PassId::UnrollLoops,
        PassId::LowerTextureProjection,
        PassId::LowerIfToCondAssign,
        PassId::MatOpToVec,
        PassId::VecIndexToCondAssign,
        PassId::LowerDiscard,
        PassId::LowerNoise,
        PassId::LowerVariableIndexToCondAssign,
        PassId::LowerQuadopVector,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PassId::LowerInstructions => "lower_instructions",
            PassId::FunctionInlining => "function_inlining",
            PassId::DeadFunctions => "dead_functions",
            PassId::StructureSplitting => "structure_splitting",
            PassId::PropagateInvariance => "propagate_invariance",
            PassId::IfSimplification => "if_simplification",
            PassId::FlattenNestedIfBlocks => "flatten_nested_if_blocks",
            PassId::ConditionalDiscard => "conditional_discard",
            PassId::CopyPropagationElements => "copy_propagation_elements",
            PassId::FlipMatrices => "flip_matrices",
            PassId::Vectorize => "vectorize",
            PassId::DeadCode => "dead_code",
            PassId::DeadCodeUnlinked => "dead_code_unlinked",
            PassId::DeadCodeLocal => "dead_code_local",
            PassId::TreeGrafting => "tree_grafting",
            PassId::ConstantPropagation => "constant_propagation",
            PassId::ConstantVariable => "constant_variable",
            PassId::ConstantVariableUnlinked => "constant_variable_unlinked",
            PassId::ConstantFolding => "constant_folding",
            PassId::MinmaxPrune => "minmax_prune",
            PassId::RebalanceTree => "rebalance_tree",
            PassId::Algebraic => "algebraic",
            PassId::LowerJumps => "lower_jumps",
            PassId::VecIndexToSwizzle => "vec_index_to_swizzle",
            PassId::LowerVectorInsert => "lower_vector_insert",
            PassId::OptimizeSwizzles => "optimize_swizzles",
            PassId::OptimizeSplitArrays => "optimize_split_arrays",
            PassId::OptimizeRedundantJumps => "optimize_redundant_jumps",
            PassId::UnrollLoops => "unroll_loops",
            PassId::LowerTextureProjection => "lower_texture_projection",
            PassId::LowerIfToCondAssign => "lower_if_to_cond_assign",
            PassId::MatOpToVec => "mat_op_to_vec",
            PassId::VecIndexToCondAssign => "vec_index_to_cond_assign",
            PassId::LowerDiscard => "lower_discard",
            PassId::LowerNoise => "lower_noise",
            PassId::LowerVariableIndexToCondAssign => "lower_variable_index_to_cond_assign",
            PassId::LowerQuadopVector => "lower_quadop_vector",
        }
    }

    pub fn from_name(name: &str) -> Option<PassId> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sub-options handed to one pass invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassArgs {
    None,
    LowerInstructions(LoweringFlags),
    DeadFunctions {
        entry: String,
    },
    DeadCode(DeadCodeOptions),
    Algebraic {
        native_integers: bool,
    },
    LowerJumps(LowerJumpsOptions),
    LowerVectorInsert {
        lower_nonconstant_index: bool,
    },
    OptimizeSplitArrays {
        linked: bool,
    },
    UnrollLoops {
        max_iterations: u32,
    },
    LowerIfToCondAssign {
        stage: ShaderStage,
        options: LowerIfToCondAssignOptions,
    },
    LowerVariableIndex {
        stage: ShaderStage,
        options: LowerVariableIndexOptions,
    },
    LowerQuadopVector {
        dont_lower_swz: bool,
    },
}

/// One scheduled pass with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInvocation {
    pub pass: PassId,
    pub args: PassArgs,
}

impl PassInvocation {
    fn new(pass: PassId, args: PassArgs) -> Self {
        Self { pass, args }
    }
}

/// Ordered pass invocations of one pipeline iteration.
///
/// The order is fixed; disabled passes are left out in place. Linked-only
/// passes are dropped for unlinked units, and the unlinked variants of dead
/// code elimination and constant-variable propagation take the place of
/// their linked counterparts.
pub fn select(
    options: &OptimizationOptions,
    stage: ShaderStage,
    linked: bool,
) -> Vec<PassInvocation> {
    let t = &options.passes;
    let c = &options.compiler;
    let mut out = Vec::new();
    let mut push = |on: bool, pass: PassId, args: PassArgs| {
        if on {
            out.push(PassInvocation::new(pass, args));
        }
    };

    push(
        t.lower_instructions,
        PassId::LowerInstructions,
        PassArgs::LowerInstructions(options.lowering.clone()),
    );
    if linked {
        push(t.function_inlining, PassId::FunctionInlining, PassArgs::None);
        push(
            t.dead_functions,
            PassId::DeadFunctions,
            PassArgs::DeadFunctions {
                entry: options.dead_functions.entry_function.clone(),
            },
        );
        push(t.structure_splitting, PassId::StructureSplitting, PassArgs::None);
    }
    push(true, PassId::PropagateInvariance, PassArgs::None);
    push(t.if_simplification, PassId::IfSimplification, PassArgs::None);
    push(
        t.flatten_nested_if_blocks,
        PassId::FlattenNestedIfBlocks,
        PassArgs::None,
    );
    push(t.conditional_discard, PassId::ConditionalDiscard, PassArgs::None);
    push(
        t.copy_propagation_elements,
        PassId::CopyPropagationElements,
        PassArgs::None,
    );
    push(
        !linked && c.optimize_for_aos && t.flip_matrices,
        PassId::FlipMatrices,
        PassArgs::None,
    );
    push(
        linked && c.optimize_for_aos && t.vectorize,
        PassId::Vectorize,
        PassArgs::None,
    );
    if linked {
        push(
            t.dead_code,
            PassId::DeadCode,
            PassArgs::DeadCode(options.dead_code.clone()),
        );
    } else {
        push(t.dead_code_unlinked, PassId::DeadCodeUnlinked, PassArgs::None);
    }
    push(t.dead_code_local, PassId::DeadCodeLocal, PassArgs::None);
    push(t.tree_grafting, PassId::TreeGrafting, PassArgs::None);
    push(t.constant_propagation, PassId::ConstantPropagation, PassArgs::None);
    if linked {
        push(t.constant_variable, PassId::ConstantVariable, PassArgs::None);
    } else {
        push(
            t.constant_variable_unlinked,
            PassId::ConstantVariableUnlinked,
            PassArgs::None,
        );
    }
    push(t.constant_folding, PassId::ConstantFolding, PassArgs::None);
    push(t.minmax_prune, PassId::MinmaxPrune, PassArgs::None);
    push(t.rebalance_tree, PassId::RebalanceTree, PassArgs::None);
    push(
        t.algebraic,
        PassId::Algebraic,
        PassArgs::Algebraic {
            native_integers: options.algebraic.native_integers,
        },
    );
    push(
        t.lower_jumps,
        PassId::LowerJumps,
        PassArgs::LowerJumps(options.lower_jumps),
    );
    push(t.vec_index_to_swizzle, PassId::VecIndexToSwizzle, PassArgs::None);
    push(
        t.lower_vector_insert,
        PassId::LowerVectorInsert,
        PassArgs::LowerVectorInsert {
            lower_nonconstant_index: options.lower_vector_insert.lower_nonconstant_index,
        },
    );
    push(t.optimize_swizzles, PassId::OptimizeSwizzles, PassArgs::None);
    push(
        t.optimize_split_arrays,
        PassId::OptimizeSplitArrays,
        PassArgs::OptimizeSplitArrays { linked },
    );
    push(
        t.optimize_redundant_jumps,
        PassId::OptimizeRedundantJumps,
        PassArgs::None,
    );
    push(
        t.unroll_loops && options.limits.max_unroll_iterations > 0,
        PassId::UnrollLoops,
        PassArgs::UnrollLoops {
            max_iterations: options.limits.max_unroll_iterations,
        },
    );
    push(
        t.lower_texture_projection,
        PassId::LowerTextureProjection,
        PassArgs::None,
    );
    push(
        t.lower_if_to_cond_assign,
        PassId::LowerIfToCondAssign,
        PassArgs::LowerIfToCondAssign {
            stage,
            options: options.lower_if_to_cond_assign,
        },
    );
    push(t.mat_op_to_vec, PassId::MatOpToVec, PassArgs::None);
    push(
        t.vec_index_to_cond_assign,
        PassId::VecIndexToCondAssign,
        PassArgs::None,
    );
    push(t.lower_discard, PassId::LowerDiscard, PassArgs::None);
    push(t.lower_noise, PassId::LowerNoise, PassArgs::None);
    push(
        t.lower_variable_index_to_cond_assign,
        PassId::LowerVariableIndexToCondAssign,
        PassArgs::LowerVariableIndex {
            stage,
            options: options.lower_variable_index,
        },
    );
    push(
        t.lower_quadop_vector,
        PassId::LowerQuadopVector,
        PassArgs::LowerQuadopVector {
            dont_lower_swz: options.lower_quadop_vector.dont_lower_swz,
        },
    );
    out
}
