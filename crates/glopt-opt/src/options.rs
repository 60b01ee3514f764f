//! Caller-configurable optimization settings.
//!
//! Every toggle is a named field. Defaults enable every pass and every
//! lowering, disable every compiler option, and cap the pipeline at 1000
//! iterations.

use alloc::string::String;

use glopt_ir::Limits;

use crate::pass_id::PassId;

/// One toggle per schedulable pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassToggles {
    pub algebraic: bool,
    pub constant_folding: bool,
    pub constant_propagation: bool,
    pub constant_variable: bool,
    pub constant_variable_unlinked: bool,
    pub copy_propagation_elements: bool,
    pub dead_code: bool,
    pub dead_code_local: bool,
    pub dead_code_unlinked: bool,
    pub dead_functions: bool,
    pub function_inlining: bool,
    pub if_simplification: bool,
    pub lower_discard: bool,
    pub lower_variable_index_to_cond_assign: bool,
    pub lower_instructions: bool,
    pub lower_jumps: bool,
    pub lower_noise: bool,
    pub lower_quadop_vector: bool,
    pub lower_texture_projection: bool,
    pub lower_if_to_cond_assign: bool,
    pub mat_op_to_vec: bool,
    pub optimize_swizzles: bool,
    pub optimize_redundant_jumps: bool,
    pub structure_splitting: bool,
    pub tree_grafting: bool,
    pub vec_index_to_cond_assign: bool,
    pub vec_index_to_swizzle: bool,
    pub flatten_nested_if_blocks: bool,
    pub conditional_discard: bool,
    pub flip_matrices: bool,
    pub vectorize: bool,
    pub minmax_prune: bool,
    pub rebalance_tree: bool,
    pub lower_vector_insert: bool,
    pub optimize_split_arrays: bool,
    pub unroll_loops: bool,
}

impl PassToggles {
    /// Every pass on.
    pub fn all() -> Self {
        Self::uniform(true)
    }

    /// Every pass off.
    pub fn none() -> Self {
        Self::uniform(false)
    }

    fn uniform(on: bool) -> Self {
        Self {
            algebraic: on,
            constant_folding: on,
            constant_propagation: on,
            constant_variable: on,
            constant_variable_unlinked: on,
            copy_propagation_elements: on,
            dead_code: on,
            dead_code_local: on,
            dead_code_unlinked: on,
            dead_functions: on,
            function_inlining: on,
            if_simplification: on,
            lower_discard: on,
            lower_variable_index_to_cond_assign: on,
            lower_instructions: on,
            lower_jumps: on,
            lower_noise: on,
            lower_quadop_vector: on,
            lower_texture_projection: on,
            lower_if_to_cond_assign: on,
            mat_op_to_vec: on,
            optimize_swizzles: on,
            optimize_redundant_jumps: on,
            structure_splitting: on,
            tree_grafting: on,
            vec_index_to_cond_assign: on,
            vec_index_to_swizzle: on,
            flatten_nested_if_blocks: on,
            conditional_discard: on,
            flip_matrices: on,
            vectorize: on,
            minmax_prune: on,
            rebalance_tree: on,
            lower_vector_insert: on,
            optimize_split_arrays: on,
            unroll_loops: on,
        }
    }

    fn slot(&mut self, pass: PassId) -> Option<&mut bool> {
        use PassId::*;
        Some(match pass {
            Algebraic => &mut self.algebraic,
            ConstantFolding => &mut self.constant_folding,
            ConstantPropagation => &mut self.constant_propagation,
            ConstantVariable => &mut self.constant_variable,
            ConstantVariableUnlinked => &mut self.constant_variable_unlinked,
            CopyPropagationElements => &mut self.copy_propagation_elements,
            DeadCode => &mut self.dead_code,
            DeadCodeLocal => &mut self.dead_code_local,
            DeadCodeUnlinked => &mut self.dead_code_unlinked,
            DeadFunctions => &mut self.dead_functions,
            FunctionInlining => &mut self.function_inlining,
            IfSimplification => &mut self.if_simplification,
            LowerDiscard => &mut self.lower_discard,
            LowerVariableIndexToCondAssign => &mut self.lower_variable_index_to_cond_assign,
            LowerInstructions => &mut self.lower_instructions,
            LowerJumps => &mut self.lower_jumps,
            LowerNoise => &mut self.lower_noise,
            LowerQuadopVector => &mut self.lower_quadop_vector,
            LowerTextureProjection => &mut self.lower_texture_projection,
            LowerIfToCondAssign => &mut self.lower_if_to_cond_assign,
            MatOpToVec => &mut self.mat_op_to_vec,
            OptimizeSwizzles => &mut self.optimize_swizzles,
            OptimizeRedundantJumps => &mut self.optimize_redundant_jumps,
            StructureSplitting => &mut self.structure_splitting,
            TreeGrafting => &mut self.tree_grafting,
            VecIndexToCondAssign => &mut self.vec_index_to_cond_assign,
            VecIndexToSwizzle => &mut self.vec_index_to_swizzle,
            FlattenNestedIfBlocks => &mut self.flatten_nested_if_blocks,
            ConditionalDiscard => &mut self.conditional_discard,
            FlipMatrices => &mut self.flip_matrices,
            Vectorize => &mut self.vectorize,
            MinmaxPrune => &mut self.minmax_prune,
            RebalanceTree => &mut self.rebalance_tree,
            LowerVectorInsert => &mut self.lower_vector_insert,
            OptimizeSplitArrays => &mut self.optimize_split_arrays,
            UnrollLoops => &mut self.unroll_loops,
            PropagateInvariance => return None,
        })
    }

    /// Check if a pass is enabled. Passes without a toggle are always on.
    pub fn is_enabled(&self, pass: PassId) -> bool {
        let mut copy = self.clone();
        copy.slot(pass).map_or(true, |on| *on)
    }

    /// Enable or disable a pass. Returns `false` for passes without a toggle.
    pub fn set(&mut self, pass: PassId, on: bool) -> bool {
        match self.slot(pass) {
            Some(slot) => {
                *slot = on;
                true
            }
            None => false,
        }
    }
}

impl Default for PassToggles {
    fn default() -> Self {
        Self::all()
    }
}

/// Instruction lowerings applied by the `lower_instructions` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweringFlags {
    pub sub_to_add_neg: bool,
    pub fdiv_to_mul_rcp: bool,
    pub exp_to_exp2: bool,
    pub pow_to_exp2: bool,
    pub log_to_log2: bool,
    pub mod_to_floor: bool,
    pub int_div_to_mul_rcp: bool,
    pub ldexp_to_arith: bool,
    pub carry_to_arith: bool,
    pub borrow_to_arith: bool,
    pub sat_to_clamp: bool,
    pub dops_to_dfrac: bool,
    pub dfrexp_dldexp_to_arith: bool,
    pub bit_count_to_math: bool,
    pub extract_to_shifts: bool,
    pub insert_to_shifts: bool,
    pub reverse_to_shifts: bool,
    pub find_lsb_to_float_cast: bool,
    pub find_msb_to_float_cast: bool,
    pub imul_high_to_mul: bool,
    pub ddiv_to_mul_rcp: bool,
    pub sqrt_to_abs_sqrt: bool,
    pub mul64_to_mul_and_mul_high: bool,
}

impl LoweringFlags {
    pub fn all() -> Self {
        Self::uniform(true)
    }

    pub fn none() -> Self {
        Self::uniform(false)
    }

    fn uniform(on: bool) -> Self {
        Self {
            sub_to_add_neg: on,
            fdiv_to_mul_rcp: on,
            exp_to_exp2: on,
            pow_to_exp2: on,
            log_to_log2: on,
            mod_to_floor: on,
            int_div_to_mul_rcp: on,
            ldexp_to_arith: on,
            carry_to_arith: on,
            borrow_to_arith: on,
            sat_to_clamp: on,
            dops_to_dfrac: on,
            dfrexp_dldexp_to_arith: on,
            bit_count_to_math: on,
            extract_to_shifts: on,
            insert_to_shifts: on,
            reverse_to_shifts: on,
            find_lsb_to_float_cast: on,
            find_msb_to_float_cast: on,
            imul_high_to_mul: on,
            ddiv_to_mul_rcp: on,
            sqrt_to_abs_sqrt: on,
            mul64_to_mul_and_mul_high: on,
        }
    }

    /// Set both float and double division lowering.
    pub fn set_div_to_mul_rcp(&mut self, on: bool) {
        self.fdiv_to_mul_rcp = on;
        self.ddiv_to_mul_rcp = on;
    }

    /// Both float and double division lowering are set.
    pub fn div_to_mul_rcp(&self) -> bool {
        self.fdiv_to_mul_rcp && self.ddiv_to_mul_rcp
    }
}

impl Default for LoweringFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Code generation behaviors of the target compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub emit_no_loops: bool,
    pub emit_no_cont: bool,
    pub emit_no_main_return: bool,
    pub emit_no_pow: bool,
    pub emit_no_sat: bool,
    pub lower_combined_clip_cull_distance: bool,
    pub emit_no_indirect_input: bool,
    pub emit_no_indirect_output: bool,
    pub emit_no_indirect_temp: bool,
    pub emit_no_indirect_uniform: bool,
    pub emit_no_indirect_sampler: bool,
    pub optimize_for_aos: bool,
    pub lower_buffer_interface_blocks: bool,
    pub clamp_block_indices_to_array_bounds: bool,
    pub position_always_invariant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgebraicOptions {
    pub native_integers: bool,
}

impl Default for AlgebraicOptions {
    fn default() -> Self {
        Self {
            native_integers: true,
        }
    }
}

/// Which jumps `lower_jumps` rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerJumpsOptions {
    pub pull_out_jumps: bool,
    pub lower_sub_return: bool,
    pub lower_main_return: bool,
    pub lower_continue: bool,
    pub lower_break: bool,
}

impl Default for LowerJumpsOptions {
    fn default() -> Self {
        Self {
            pull_out_jumps: true,
            lower_sub_return: true,
            lower_main_return: true,
            lower_continue: true,
            lower_break: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerIfToCondAssignOptions {
    pub max_depth: u32,
    pub min_branch_cost: u32,
}

impl Default for LowerIfToCondAssignOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_branch_cost: 1,
        }
    }
}

/// Variable classes whose indirect indexing is lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowerVariableIndexOptions {
    pub lower_input: bool,
    pub lower_output: bool,
    pub lower_temp: bool,
    pub lower_uniform: bool,
}

impl Default for LowerVariableIndexOptions {
    fn default() -> Self {
        Self {
            lower_input: true,
            lower_output: true,
            lower_temp: true,
            lower_uniform: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadCodeOptions {
    /// Keep only uniforms that were given a location
    pub keep_only_assigned_uniforms: bool,
}

impl Default for DeadCodeOptions {
    fn default() -> Self {
        Self {
            keep_only_assigned_uniforms: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadFunctionOptions {
    pub entry_function: String,
}

impl Default for DeadFunctionOptions {
    fn default() -> Self {
        Self {
            entry_function: String::from("main"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LowerVectorInsertOptions {
    pub lower_nonconstant_index: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerQuadopVectorOptions {
    pub dont_lower_swz: bool,
}

impl Default for LowerQuadopVectorOptions {
    fn default() -> Self {
        Self {
            dont_lower_swz: true,
        }
    }
}

/// Default pipeline iteration ceiling.
pub const DEFAULT_MAX_PASSES: u32 = 1000;

/// Complete, immutable configuration of one optimization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOptions {
    pub passes: PassToggles,
    pub lowering: LoweringFlags,
    pub compiler: CompilerOptions,
    pub algebraic: AlgebraicOptions,
    pub lower_jumps: LowerJumpsOptions,
    pub lower_if_to_cond_assign: LowerIfToCondAssignOptions,
    pub lower_variable_index: LowerVariableIndexOptions,
    pub dead_code: DeadCodeOptions,
    pub dead_functions: DeadFunctionOptions,
    pub lower_vector_insert: LowerVectorInsertOptions,
    pub lower_quadop_vector: LowerQuadopVectorOptions,
    pub limits: Limits,
    /// Pipeline iteration ceiling
    pub max_passes: u32,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            passes: PassToggles::default(),
            lowering: LoweringFlags::default(),
            compiler: CompilerOptions::default(),
            algebraic: AlgebraicOptions::default(),
            lower_jumps: LowerJumpsOptions::default(),
            lower_if_to_cond_assign: LowerIfToCondAssignOptions::default(),
            lower_variable_index: LowerVariableIndexOptions::default(),
            dead_code: DeadCodeOptions::default(),
            dead_functions: DeadFunctionOptions::default(),
            lower_vector_insert: LowerVectorInsertOptions::default(),
            lower_quadop_vector: LowerQuadopVectorOptions::default(),
            limits: Limits::default(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl OptimizationOptions {
    /// Options with every pass disabled.
    pub fn no_passes() -> Self {
        Self {
            passes: PassToggles::none(),
            ..Self::default()
        }
    }
}
