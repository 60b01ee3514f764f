//! Builtin functions outside the texture family.
//!
//! Most map onto an IR operator. The rest stay calls to the target's
//! builtin, with a rule deriving the result type from the arguments.

use glopt_ir::{BaseType, ExprOp};

/// How a builtin function call lowers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    /// Component-wise operator over float operands; a trailing scalar
    /// operand is broadcast
    Float(ExprOp),
    /// Component-wise operator over any numeric operands
    Numeric(ExprOp),
    /// Integer operator whose result has the operand's shape in `BaseType`
    Integer(ExprOp, Option<BaseType>),
    Dot,
    Clamp,
    Mix,
    Fma,
    Ldexp,
    /// Vector comparison; `true` swaps the operands
    Relational(ExprOp, bool),
    Not,
    Any,
    All,
    /// Bit reinterpretation to the given base type
    Bitcast(ExprOp, BaseType),
    /// Pack into a uint
    Pack(ExprOp),
    /// Unpack a uint into a float vector of the given size
    Unpack(ExprOp, u8),
    Noise1,
    Interpolate(ExprOp),
    /// Kept as a call to the builtin
    Call(CallResult),
}

/// Result type rule for builtins kept as calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResult {
    /// Same type as the argument at this index
    Arg(usize),
    /// Scalar float
    Float,
    /// Bool vector shaped like the argument at this index
    Bool(usize),
    /// Float vector of this size
    FloatVector(u8),
    Transpose,
    OuterProduct,
}

/// Look up builtin `name` called with `argc` arguments.
pub fn math_function(name: &str, argc: usize) -> Option<MathFunction> {
    use ExprOp::*;
    use MathFunction as M;

    let f = match (name, argc) {
        ("sin", 1) => M::Float(Sin),
        ("cos", 1) => M::Float(Cos),
        ("atan", 1) => M::Float(Atan),
        ("atan", 2) => M::Float(Atan2),
        ("pow", 2) => M::Float(Pow),
        ("exp", 1) => M::Float(Exp),
        ("log", 1) => M::Float(Log),
        ("exp2", 1) => M::Float(Exp2),
        ("log2", 1) => M::Float(Log2),
        ("sqrt", 1) => M::Float(Sqrt),
        ("inversesqrt", 1) => M::Float(Rsq),
        ("floor", 1) => M::Float(Floor),
        ("trunc", 1) => M::Float(Trunc),
        ("ceil", 1) => M::Float(Ceil),
        ("fract", 1) => M::Float(Fract),
        ("roundEven", 1) => M::Float(RoundEven),
        ("mod", 2) => M::Float(Mod),
        ("dFdx", 1) => M::Float(Dfdx),
        ("dFdy", 1) => M::Float(Dfdy),
        ("dFdxCoarse", 1) => M::Float(DfdxCoarse),
        ("dFdyCoarse", 1) => M::Float(DfdyCoarse),
        ("dFdxFine", 1) => M::Float(DfdxFine),
        ("dFdyFine", 1) => M::Float(DfdyFine),
        ("abs", 1) => M::Numeric(Abs),
        ("sign", 1) => M::Numeric(Sign),
        ("min", 2) => M::Numeric(Min),
        ("max", 2) => M::Numeric(Max),
        ("bitfieldReverse", 1) => M::Integer(BitfieldReverse, None),
        ("bitCount", 1) => M::Integer(BitCount, Some(BaseType::Int)),
        ("findLSB", 1) => M::Integer(FindLsb, Some(BaseType::Int)),
        ("findMSB", 1) => M::Integer(FindMsb, Some(BaseType::Int)),
        ("dot", 2) => M::Dot,
        ("clamp", 3) => M::Clamp,
        ("mix", 3) => M::Mix,
        ("fma", 3) => M::Fma,
        ("ldexp", 2) => M::Ldexp,
        ("lessThan", 2) => M::Relational(Less, false),
        ("greaterThan", 2) => M::Relational(Less, true),
        ("lessThanEqual", 2) => M::Relational(Gequal, true),
        ("greaterThanEqual", 2) => M::Relational(Gequal, false),
        ("equal", 2) => M::Relational(Equal, false),
        ("notEqual", 2) => M::Relational(Nequal, false),
        ("not", 1) => M::Not,
        ("any", 1) => M::Any,
        ("all", 1) => M::All,
        ("floatBitsToInt", 1) => M::Bitcast(BitcastF2i, BaseType::Int),
        ("floatBitsToUint", 1) => M::Bitcast(BitcastF2u, BaseType::UInt),
        ("intBitsToFloat", 1) => M::Bitcast(BitcastI2f, BaseType::Float),
        ("uintBitsToFloat", 1) => M::Bitcast(BitcastU2f, BaseType::Float),
        ("packSnorm2x16", 1) => M::Pack(PackSnorm2x16),
        ("packSnorm4x8", 1) => M::Pack(PackSnorm4x8),
        ("packUnorm2x16", 1) => M::Pack(PackUnorm2x16),
        ("packUnorm4x8", 1) => M::Pack(PackUnorm4x8),
        ("packHalf2x16", 1) => M::Pack(PackHalf2x16),
        ("unpackSnorm2x16", 1) => M::Unpack(UnpackSnorm2x16, 2),
        ("unpackSnorm4x8", 1) => M::Unpack(UnpackSnorm4x8, 4),
        ("unpackUnorm2x16", 1) => M::Unpack(UnpackUnorm2x16, 2),
        ("unpackUnorm4x8", 1) => M::Unpack(UnpackUnorm4x8, 4),
        ("unpackHalf2x16", 1) => M::Unpack(UnpackHalf2x16, 2),
        ("noise1", 1) => M::Noise1,
        ("interpolateAtCentroid", 1) => M::Interpolate(InterpolateAtCentroid),
        ("interpolateAtOffset", 2) => M::Interpolate(InterpolateAtOffset),
        ("interpolateAtSample", 2) => M::Interpolate(InterpolateAtSample),
        _ => return call_function(name, argc).map(M::Call),
    };
    Some(f)
}

fn call_function(name: &str, argc: usize) -> Option<CallResult> {
    use CallResult::*;

    let rule = match (name, argc) {
        ("radians" | "degrees" | "tan" | "asin" | "acos", 1) => Arg(0),
        ("sinh" | "cosh" | "tanh" | "asinh" | "acosh" | "atanh", 1) => Arg(0),
        ("round" | "fwidth" | "fwidthCoarse" | "fwidthFine", 1) => Arg(0),
        ("normalize", 1) => Arg(0),
        ("inverse", 1) => Arg(0),
        ("length", 1) | ("distance", 2) | ("determinant", 1) => Float,
        ("cross", 2) | ("reflect", 2) | ("matrixCompMult", 2) => Arg(0),
        ("step", 2) => Arg(1),
        ("smoothstep", 3) => Arg(2),
        ("faceforward", 3) | ("refract", 3) => Arg(0),
        ("isnan" | "isinf", 1) => Bool(0),
        ("transpose", 1) => Transpose,
        ("outerProduct", 2) => OuterProduct,
        ("noise2", 1) => FloatVector(2),
        ("noise3", 1) => FloatVector(3),
        ("noise4", 1) => FloatVector(4),
        _ => return None,
    };
    Some(rule)
}
