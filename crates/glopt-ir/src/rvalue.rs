//! Value-producing IR nodes: expressions, texture operations, swizzles,
//! dereferences and constants.

use alloc::{boxed::Box, string::String, vec::Vec};

use crate::{
    constant::Constant,
    types::{BaseType, Type},
    variable::{VarId, VarTable},
};

/// Expression operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprOp {
    // Unary
    BitNot,
    LogicNot,
    Neg,
    Abs,
    Sign,
    Rcp,
    Rsq,
    Sqrt,
    Exp,
    Log,
    Exp2,
    Log2,
    F2i,
    F2u,
    I2f,
    F2b,
    B2f,
    I2b,
    B2i,
    U2f,
    I2u,
    U2i,
    D2f,
    F2d,
    D2i,
    I2d,
    D2u,
    U2d,
    D2b,
    BitcastI2f,
    BitcastF2i,
    BitcastU2f,
    BitcastF2u,
    Trunc,
    Ceil,
    Floor,
    Fract,
    RoundEven,
    Sin,
    Cos,
    Atan,
    Dfdx,
    DfdxCoarse,
    DfdxFine,
    Dfdy,
    DfdyCoarse,
    DfdyFine,
    PackSnorm2x16,
    PackSnorm4x8,
    PackUnorm2x16,
    PackUnorm4x8,
    PackHalf2x16,
    UnpackSnorm2x16,
    UnpackSnorm4x8,
    UnpackUnorm2x16,
    UnpackUnorm4x8,
    UnpackHalf2x16,
    BitfieldReverse,
    BitCount,
    FindMsb,
    FindLsb,
    Saturate,
    Noise,
    InterpolateAtCentroid,

    // Binary
    Add,
    Sub,
    Mul,
    ImulHigh,
    Div,
    Carry,
    Borrow,
    Mod,
    Less,
    Gequal,
    Equal,
    Nequal,
    AllEqual,
    AnyNequal,
    Lshift,
    Rshift,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicXor,
    LogicOr,
    Dot,
    Min,
    Max,
    Pow,
    Ldexp,
    VectorExtract,
    InterpolateAtOffset,
    InterpolateAtSample,
    Atan2,

    // Ternary
    Fma,
    Lrp,
    Csel,
    BitfieldExtract,
    VectorInsert,

    // Quaternary
    BitfieldInsert,
    Vector,
}

impl ExprOp {
    /// Number of operands the operator takes.
    pub fn arity(self) -> usize {
        use ExprOp::*;
        match self {
            Add | Sub | Mul | ImulHigh | Div | Carry | Borrow | Mod | Less | Gequal | Equal
            | Nequal | AllEqual | AnyNequal | Lshift | Rshift | BitAnd | BitXor | BitOr
            | LogicAnd | LogicXor | LogicOr | Dot | Min | Max | Pow | Ldexp | VectorExtract
            | InterpolateAtOffset | InterpolateAtSample | Atan2 => 2,
            Fma | Lrp | Csel | BitfieldExtract | VectorInsert => 3,
            BitfieldInsert | Vector => 4,
            _ => 1,
        }
    }

    /// Numeric conversion printed as a constructor of the result type.
    pub fn is_conversion(self) -> bool {
        use ExprOp::*;
        matches!(
            self,
            F2i | F2u | I2f | F2b | B2f | I2b | B2i | U2f | I2u | U2i
        )
    }

    /// Component-wise ordering or equality comparison.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            ExprOp::Less | ExprOp::Gequal | ExprOp::Equal | ExprOp::Nequal
        )
    }

    /// Operator whose operands may be swapped without changing the result.
    pub fn is_commutative(self) -> bool {
        use ExprOp::*;
        matches!(
            self,
            Add | Mul | Equal | Nequal | AllEqual | AnyNequal | BitAnd | BitXor | BitOr
                | LogicAnd | LogicXor | LogicOr | Dot | Min | Max
        )
    }

    /// Comparison testing the opposite condition (`a < b` for `a >= b`).
    pub fn inverse_comparison(self) -> Option<ExprOp> {
        match self {
            ExprOp::Less => Some(ExprOp::Gequal),
            ExprOp::Gequal => Some(ExprOp::Less),
            ExprOp::Equal => Some(ExprOp::Nequal),
            ExprOp::Nequal => Some(ExprOp::Equal),
            ExprOp::AllEqual => Some(ExprOp::AnyNequal),
            ExprOp::AnyNequal => Some(ExprOp::AllEqual),
            _ => None,
        }
    }

    /// Spelling used in shading-language output.
    ///
    /// Operators without a source-level equivalent produce a `_TODO`
    /// placeholder.
    pub fn glsl_name(self) -> &'static str {
        use ExprOp::*;
        match self {
            BitNot => "~",
            LogicNot => "!",
            Neg => "-",
            Abs => "abs",
            Sign => "sign",
            Rcp => "1.0/",
            Rsq => "inversesqrt",
            Sqrt => "sqrt",
            Exp => "exp",
            Log => "log",
            Exp2 => "exp2",
            Log2 => "log2",
            F2i | B2i | U2i | D2i => "int",
            F2u | I2u | D2u => "uint",
            I2f | B2f | U2f | D2f => "float",
            F2b | I2b | D2b => "bool",
            F2d | I2d | U2d => "double",
            BitcastI2f => "intBitsToFloat",
            BitcastF2i => "floatBitsToInt",
            BitcastU2f => "uintBitsToFloat",
            BitcastF2u => "floatBitsToUint",
            Trunc => "trunc",
            Ceil => "ceil",
            Floor => "floor",
            Fract => "fract",
            RoundEven => "roundEven",
            Sin => "sin",
            Cos => "cos",
            Atan => "atan",
            Dfdx => "dFdx",
            DfdxCoarse => "dFdxCoarse",
            DfdxFine => "dFdxFine",
            Dfdy => "dFdy",
            DfdyCoarse => "dFdyCoarse",
            DfdyFine => "dFdyFine",
            PackSnorm2x16 => "packSnorm2x16",
            PackSnorm4x8 => "packSnorm4x8",
            PackUnorm2x16 => "packUnorm2x16",
            PackUnorm4x8 => "packUnorm4x8",
            PackHalf2x16 => "packHalf2x16",
            UnpackSnorm2x16 => "unpackSnorm2x16",
            UnpackSnorm4x8 => "unpackSnorm4x8",
            UnpackUnorm2x16 => "unpackUnorm2x16",
            UnpackUnorm4x8 => "unpackUnorm4x8",
            UnpackHalf2x16 => "unpackHalf2x16",
            BitfieldReverse => "bitfieldReverse",
            BitCount => "bitCount",
            FindMsb => "findMSB",
            FindLsb => "findLSB",
            Saturate => "clamp",
            Noise => "noise",
            InterpolateAtCentroid => "interpolateAtCentroid",
            Add => "+",
            Sub => "-",
            Mul => "*",
            ImulHigh => "imul_high_TODO",
            Div => "/",
            Carry => "carry_TODO",
            Borrow => "borrow_TODO",
            Mod => "mod",
            Less => "<",
            Gequal => ">=",
            Equal => "==",
            Nequal => "!=",
            AllEqual => "all_equal_TODO",
            AnyNequal => "any_nequal_TODO",
            Lshift => "<<",
            Rshift => ">>",
            BitAnd => "&",
            BitXor => "^",
            BitOr => "|",
            LogicAnd => "&&",
            LogicXor => "^^",
            LogicOr => "||",
            Dot => "dot",
            Min => "min",
            Max => "max",
            Pow => "pow",
            Ldexp => "ldexp_TODO",
            VectorExtract => "vector_extract_TODO",
            InterpolateAtOffset => "interpolate_at_offset_TODO",
            InterpolateAtSample => "interpolate_at_sample_TODO",
            Atan2 => "atan",
            Fma => "fma",
            Lrp => "mix",
            Csel => "csel",
            BitfieldExtract => "bitfield_extract_TODO",
            VectorInsert => "vector_insert_TODO",
            BitfieldInsert => "bitfield_insert_TODO",
            Vector => "vector_TODO",
        }
    }

    /// Operator name used by the tree dump.
    pub fn tree_name(self) -> &'static str {
        use ExprOp::*;
        match self {
            BitNot => "bit_not",
            LogicNot => "logic_not",
            Neg => "neg",
            Abs => "abs",
            Sign => "sign",
            Rcp => "rcp",
            Rsq => "rsq",
            Sqrt => "sqrt",
            Exp => "exp",
            Log => "log",
            Exp2 => "exp2",
            Log2 => "log2",
            F2i => "f2i",
            F2u => "f2u",
            I2f => "i2f",
            F2b => "f2b",
            B2f => "b2f",
            I2b => "i2b",
            B2i => "b2i",
            U2f => "u2f",
            I2u => "i2u",
            U2i => "u2i",
            D2f => "d2f",
            F2d => "f2d",
            D2i => "d2i",
            I2d => "i2d",
            D2u => "d2u",
            U2d => "u2d",
            D2b => "d2b",
            BitcastI2f => "bitcast_i2f",
            BitcastF2i => "bitcast_f2i",
            BitcastU2f => "bitcast_u2f",
            BitcastF2u => "bitcast_f2u",
            Trunc => "trunc",
            Ceil => "ceil",
            Floor => "floor",
            Fract => "fract",
            RoundEven => "round_even",
            Sin => "sin",
            Cos => "cos",
            Atan => "atan",
            Dfdx => "dFdx",
            DfdxCoarse => "dFdx_coarse",
            DfdxFine => "dFdx_fine",
            Dfdy => "dFdy",
            DfdyCoarse => "dFdy_coarse",
            DfdyFine => "dFdy_fine",
            PackSnorm2x16 => "pack_snorm_2x16",
            PackSnorm4x8 => "pack_snorm_4x8",
            PackUnorm2x16 => "pack_unorm_2x16",
            PackUnorm4x8 => "pack_unorm_4x8",
            PackHalf2x16 => "pack_half_2x16",
            UnpackSnorm2x16 => "unpack_snorm_2x16",
            UnpackSnorm4x8 => "unpack_snorm_4x8",
            UnpackUnorm2x16 => "unpack_unorm_2x16",
            UnpackUnorm4x8 => "unpack_unorm_4x8",
            UnpackHalf2x16 => "unpack_half_2x16",
            BitfieldReverse => "bitfield_reverse",
            BitCount => "bit_count",
            FindMsb => "find_msb",
            FindLsb => "find_lsb",
            Saturate => "saturate",
            Noise => "noise",
            InterpolateAtCentroid => "interpolate_at_centroid",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            ImulHigh => "imul_high",
            Div => "div",
            Carry => "carry",
            Borrow => "borrow",
            Mod => "mod",
            Less => "less",
            Gequal => "gequal",
            Equal => "equal",
            Nequal => "nequal",
            AllEqual => "all_equal",
            AnyNequal => "any_nequal",
            Lshift => "lshift",
            Rshift => "rshift",
            BitAnd => "bit_and",
            BitXor => "bit_xor",
            BitOr => "bit_or",
            LogicAnd => "logic_and",
            LogicXor => "logic_xor",
            LogicOr => "logic_or",
            Dot => "dot",
            Min => "min",
            Max => "max",
            Pow => "pow",
            Ldexp => "ldexp",
            VectorExtract => "vector_extract",
            InterpolateAtOffset => "interpolate_at_offset",
            InterpolateAtSample => "interpolate_at_sample",
            Atan2 => "atan2",
            Fma => "fma",
            Lrp => "lrp",
            Csel => "csel",
            BitfieldExtract => "bitfield_extract",
            VectorInsert => "vector_insert",
            BitfieldInsert => "bitfield_insert",
            Vector => "vector",
        }
    }
}

/// An operator applied to operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub op: ExprOp,
    /// Result type
    pub ty: Type,
    pub operands: Vec<Rvalue>,
}

/// Texture operation kind, carrying its level-of-detail operands.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureOp {
    /// Implicit-lod sample
    Tex,
    /// Sample with lod bias
    Txb { bias: Rvalue },
    /// Explicit-lod sample
    Txl { lod: Rvalue },
    /// Texel fetch
    Txf { lod: Rvalue },
    /// Multisample texel fetch
    TxfMs { sample_index: Rvalue },
    /// Sample with explicit gradients
    Txd { dpdx: Rvalue, dpdy: Rvalue },
    /// Size query
    Txs { lod: Rvalue },
    /// Lod query
    Lod,
}

impl TextureOp {
    /// Opcode name used by the tree dump.
    pub fn name(&self) -> &'static str {
        match self {
            TextureOp::Tex => "tex",
            TextureOp::Txb { .. } => "txb",
            TextureOp::Txl { .. } => "txl",
            TextureOp::Txf { .. } => "txf",
            TextureOp::TxfMs { .. } => "txf_ms",
            TextureOp::Txd { .. } => "txd",
            TextureOp::Txs { .. } => "txs",
            TextureOp::Lod => "lod",
        }
    }

    /// Operations addressing texels by integer coordinate or querying size
    /// take no projector and no shadow comparator.
    pub fn takes_projector(&self) -> bool {
        !matches!(
            self,
            TextureOp::Txf { .. } | TextureOp::TxfMs { .. } | TextureOp::Txs { .. }
        )
    }

    /// Level-of-detail operands in evaluation order.
    pub fn operands(&self) -> Vec<&Rvalue> {
        match self {
            TextureOp::Tex | TextureOp::Lod => Vec::new(),
            TextureOp::Txb { bias } => alloc::vec![bias],
            TextureOp::Txl { lod } | TextureOp::Txf { lod } | TextureOp::Txs { lod } => {
                alloc::vec![lod]
            }
            TextureOp::TxfMs { sample_index } => alloc::vec![sample_index],
            TextureOp::Txd { dpdx, dpdy } => alloc::vec![dpdx, dpdy],
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Rvalue> {
        match self {
            TextureOp::Tex | TextureOp::Lod => Vec::new(),
            TextureOp::Txb { bias } => alloc::vec![bias],
            TextureOp::Txl { lod } | TextureOp::Txf { lod } | TextureOp::Txs { lod } => {
                alloc::vec![lod]
            }
            TextureOp::TxfMs { sample_index } => alloc::vec![sample_index],
            TextureOp::Txd { dpdx, dpdy } => alloc::vec![dpdx, dpdy],
        }
    }
}

/// A texture sampling or query operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub op: TextureOp,
    /// Result type
    pub ty: Type,
    pub sampler: Deref,
    /// Absent for size queries
    pub coordinate: Option<Rvalue>,
    /// Projective divisor
    pub projector: Option<Rvalue>,
    pub shadow_comparator: Option<Rvalue>,
    /// Constant texel offset
    pub offset: Option<Rvalue>,
}

impl Texture {
    /// Sample `sampler` at `coordinate` with implicit lod.
    pub fn sample(ty: Type, sampler: Deref, coordinate: Rvalue) -> Self {
        Self {
            op: TextureOp::Tex,
            ty,
            sampler,
            coordinate: Some(coordinate),
            projector: None,
            shadow_comparator: None,
            offset: None,
        }
    }
}

/// Component selection mask of a swizzle (up to four components, each
/// 0..=3 for `x`..`w`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwizzleMask {
    pub components: [u8; 4],
    pub count: u8,
}

impl SwizzleMask {
    /// Build a mask from component indices.
    ///
    /// Returns `None` for an empty selection, more than four components, or
    /// an index past `w`.
    pub fn new(components: &[u8]) -> Option<Self> {
        if components.is_empty() || components.len() > 4 || components.iter().any(|c| *c > 3) {
            return None;
        }
        let mut mask = [0u8; 4];
        mask[..components.len()].copy_from_slice(components);
        Some(Self {
            components: mask,
            count: components.len() as u8,
        })
    }

    /// Parse `xyzw`, `rgba` or `stpq` letters.
    pub fn parse(letters: &str) -> Option<Self> {
        let mut comps = Vec::new();
        for ch in letters.chars() {
            let c = match ch {
                'x' | 'r' | 's' => 0,
                'y' | 'g' | 't' => 1,
                'z' | 'b' | 'p' => 2,
                'w' | 'a' | 'q' => 3,
                _ => return None,
            };
            comps.push(c);
        }
        Self::new(&comps)
    }

    /// Mask selecting the first `n` components in order.
    pub fn identity(n: u8) -> Option<Self> {
        let comps: Vec<u8> = (0..n).collect();
        Self::new(&comps)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.components[..self.count as usize].iter().copied()
    }

    /// Letters in `xyzw` form.
    pub fn letters(&self) -> String {
        self.iter().map(|c| component_letter(c)).collect()
    }

    /// Selects components `0..n` in order.
    pub fn is_identity(&self, n: u8) -> bool {
        self.count == n && self.iter().enumerate().all(|(i, c)| i as u8 == c)
    }

    /// Component selected at position `i`.
    pub fn get(&self, i: usize) -> Option<u8> {
        if i < self.count as usize {
            Some(self.components[i])
        } else {
            None
        }
    }
}

/// `x`, `y`, `z` or `w` for component 0..=3.
pub fn component_letter(c: u8) -> char {
    match c {
        0 => 'x',
        1 => 'y',
        2 => 'z',
        _ => 'w',
    }
}

/// A component selection from a vector or scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Swizzle {
    pub val: Rvalue,
    pub mask: SwizzleMask,
}

/// An access path to storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Deref {
    /// Whole variable
    Var(VarId),
    /// Array element, matrix column or vector component
    Array {
        array: Box<Rvalue>,
        index: Box<Rvalue>,
    },
    /// Structure field by index
    Record { record: Box<Rvalue>, field: usize },
}

impl Deref {
    pub fn array(array: Rvalue, index: Rvalue) -> Self {
        Deref::Array {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn record(record: Rvalue, field: usize) -> Self {
        Deref::Record {
            record: Box::new(record),
            field,
        }
    }

    /// Variable at the root of the access path, if the path is rooted at a
    /// variable.
    pub fn root_var(&self) -> Option<VarId> {
        match self {
            Deref::Var(id) => Some(*id),
            Deref::Array { array, .. } => array.root_var(),
            Deref::Record { record, .. } => record.root_var(),
        }
    }

    /// Whole-variable access.
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Deref::Var(id) => Some(*id),
            _ => None,
        }
    }

    pub fn ty(&self, vars: &VarTable) -> Type {
        match self {
            Deref::Var(id) => vars.ty(*id),
            Deref::Array { array, .. } => array.ty(vars).index_result().unwrap_or(Type::Void),
            Deref::Record { record, field } => match record.ty(vars) {
                Type::Struct(s) => s.fields.get(*field).map(|f| f.ty.clone()).unwrap_or(Type::Void),
                _ => Type::Void,
            },
        }
    }
}

/// A value-producing node.
#[derive(Debug, Clone, PartialEq)]
pub enum Rvalue {
    Expression(Box<Expression>),
    Texture(Box<Texture>),
    Swizzle(Box<Swizzle>),
    Deref(Deref),
    Constant(Constant),
}

impl Rvalue {
    /// Reference to a whole variable.
    pub fn var(id: VarId) -> Self {
        Rvalue::Deref(Deref::Var(id))
    }

    pub fn constant(c: Constant) -> Self {
        Rvalue::Constant(c)
    }

    pub fn expr(op: ExprOp, ty: Type, operands: Vec<Rvalue>) -> Self {
        Rvalue::Expression(Box::new(Expression { op, ty, operands }))
    }

    pub fn unop(op: ExprOp, ty: Type, a: Rvalue) -> Self {
        Self::expr(op, ty, alloc::vec![a])
    }

    pub fn binop(op: ExprOp, ty: Type, a: Rvalue, b: Rvalue) -> Self {
        Self::expr(op, ty, alloc::vec![a, b])
    }

    pub fn swizzle(val: Rvalue, mask: SwizzleMask) -> Self {
        Rvalue::Swizzle(Box::new(Swizzle { val, mask }))
    }

    /// Result type, resolving variable types through `vars`.
    pub fn ty(&self, vars: &VarTable) -> Type {
        match self {
            Rvalue::Expression(e) => e.ty.clone(),
            Rvalue::Texture(t) => t.ty.clone(),
            Rvalue::Swizzle(s) => {
                let base = s.val.ty(vars).base_type().unwrap_or(BaseType::Float);
                Type::vector(base, s.mask.count)
            }
            Rvalue::Deref(d) => d.ty(vars),
            Rvalue::Constant(c) => c.ty.clone(),
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Rvalue::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Rvalue::Expression(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_deref(&self) -> Option<&Deref> {
        match self {
            Rvalue::Deref(d) => Some(d),
            _ => None,
        }
    }

    /// Whole-variable reference.
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Rvalue::Deref(Deref::Var(id)) => Some(*id),
            _ => None,
        }
    }

    /// Variable at the root of a dereference chain.
    pub fn root_var(&self) -> Option<VarId> {
        match self {
            Rvalue::Deref(d) => d.root_var(),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Rvalue::Constant(_))
    }

    /// Number of nodes in the tree, used to bound rewrites.
    pub fn node_count(&self) -> usize {
        1 + match self {
            Rvalue::Expression(e) => e.operands.iter().map(Rvalue::node_count).sum(),
            Rvalue::Texture(t) => {
                let mut n = 1;
                for v in [&t.coordinate, &t.projector, &t.shadow_comparator, &t.offset]
                    .into_iter()
                    .flatten()
                {
                    n += v.node_count();
                }
                n + t.op.operands().iter().map(|v| v.node_count()).sum::<usize>()
            }
            Rvalue::Swizzle(s) => s.val.node_count(),
            Rvalue::Deref(Deref::Var(_)) | Rvalue::Constant(_) => 0,
            Rvalue::Deref(Deref::Array { array, index }) => {
                array.node_count() + index.node_count()
            }
            Rvalue::Deref(Deref::Record { record, .. }) => record.node_count(),
        }
    }
}

impl From<Deref> for Rvalue {
    fn from(d: Deref) -> Self {
        Rvalue::Deref(d)
    }
}

impl From<Constant> for Rvalue {
    fn from(c: Constant) -> Self {
        Rvalue::Constant(c)
    }
}
