//! Compile-time evaluation of expressions over constant operands.
//!
//! Component-wise operators broadcast scalar operands. Operators whose
//! result depends on more than one component of an operand (dot products,
//! whole-value equality, extraction) are handled explicitly. Matrix
//! products and packing operators are never folded.

use alloc::{vec, vec::Vec};
use core::cmp::Ordering;

use glopt_ir::{visit, BaseType, Constant, Deref, ExprOp, Rvalue, ScalarValue, SwizzleMask, Type};

/// Evaluate `op` over constant operands, producing a constant of type `ty`.
///
/// Returns `None` when the operation cannot be evaluated at compile time
/// (integer division by zero, unsupported operator, shape mismatch).
pub fn evaluate(op: ExprOp, ty: &Type, operands: &[&Constant]) -> Option<Constant> {
    use ExprOp::*;

    if operands.len() != op.arity() {
        return None;
    }
    let base = ty.base_type()?;
    let n = ty.components() as usize;
    let values: Vec<Vec<ScalarValue>> = operands.iter().map(|c| c.components()).collect();
    if values.iter().any(Vec::is_empty) {
        return None;
    }

    let scalars: Vec<ScalarValue> = match op {
        Dot => vec![dot(&values[0], &values[1])?],
        AllEqual => vec![ScalarValue::Bool(values[0] == values[1])],
        AnyNequal => vec![ScalarValue::Bool(values[0] != values[1])],
        VectorExtract => {
            let i = usize::try_from(operands[1].get_int_component(0)?).ok()?;
            vec![*values[0].get(i)?]
        }
        VectorInsert => {
            let i = usize::try_from(operands[2].get_int_component(0)?).ok()?;
            let mut v = values[0].clone();
            *v.get_mut(i)? = values[1][0];
            v
        }
        Vector => (0..n)
            .map(|i| values.get(i).and_then(|v| v.first().copied()))
            .collect::<Option<_>>()?,
        Csel => (0..n)
            .map(|i| {
                if pick(&values[0], i, n)?.as_bool() {
                    pick(&values[1], i, n)
                } else {
                    pick(&values[2], i, n)
                }
            })
            .collect::<Option<_>>()?,
        Fma => (0..n)
            .map(|i| {
                let ab = binary(Mul, pick(&values[0], i, n)?, pick(&values[1], i, n)?)?;
                binary(Add, ab, pick(&values[2], i, n)?)
            })
            .collect::<Option<_>>()?,
        Lrp => (0..n)
            .map(|i| {
                let x = pick(&values[0], i, n)?;
                let y = pick(&values[1], i, n)?;
                let a = pick(&values[2], i, n)?;
                let d = binary(Mul, binary(Sub, y, x)?, a)?;
                binary(Add, x, d)
            })
            .collect::<Option<_>>()?,
        BitfieldExtract | BitfieldInsert | InterpolateAtOffset | InterpolateAtSample
        | InterpolateAtCentroid | Noise | PackSnorm2x16 | PackSnorm4x8 | PackUnorm2x16
        | PackUnorm4x8 | PackHalf2x16 | UnpackSnorm2x16 | UnpackSnorm4x8 | UnpackUnorm2x16
        | UnpackUnorm4x8 | UnpackHalf2x16 => return None,
        Mul if is_linear_algebra(operands) => return None,
        _ if op.arity() == 1 => (0..n)
            .map(|i| unary(op, pick(&values[0], i, n)?, base))
            .collect::<Option<_>>()?,
        _ => (0..n)
            .map(|i| binary(op, pick(&values[0], i, n)?, pick(&values[1], i, n)?))
            .collect::<Option<_>>()?,
    };
    Constant::from_scalars(ty.clone(), &scalars)
}

/// Fold every constant subtree of `rv` in place.
pub fn fold_rvalue(rv: &mut Rvalue) -> bool {
    visit::rewrite_rvalue(rv, &mut fold_node)
}

/// Replace `rv` by a constant if all of its direct operands are constants.
pub fn fold_node(rv: &mut Rvalue) -> bool {
    let folded = match rv {
        Rvalue::Expression(e) => {
            let consts: Option<Vec<&Constant>> =
                e.operands.iter().map(Rvalue::as_constant).collect();
            consts.and_then(|c| evaluate(e.op, &e.ty, &c))
        }
        Rvalue::Swizzle(s) => s
            .val
            .as_constant()
            .and_then(|c| swizzle_constant(c, &s.mask)),
        Rvalue::Deref(Deref::Array { array, index }) => {
            match (array.as_constant(), index.as_constant()) {
                (Some(a), Some(i)) => i
                    .get_int_component(0)
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| index_constant(a, i)),
                _ => None,
            }
        }
        Rvalue::Deref(Deref::Record { record, field }) => record
            .as_constant()
            .and_then(|c| c.struct_field(*field).cloned()),
        _ => None,
    };
    match folded {
        Some(c) => {
            *rv = Rvalue::Constant(c);
            true
        }
        None => false,
    }
}

/// Components of a scalar or vector constant selected by `mask`.
pub fn swizzle_constant(c: &Constant, mask: &SwizzleMask) -> Option<Constant> {
    if !(c.ty.is_scalar() || c.ty.is_vector()) {
        return None;
    }
    let base = c.ty.base_type()?;
    let picked: Vec<ScalarValue> = mask
        .iter()
        .map(|i| c.component(i as usize))
        .collect::<Option<_>>()?;
    Constant::from_scalars(Type::vector(base, mask.count), &picked)
}

/// Element `i` of an array, column `i` of a matrix, or component `i` of a
/// vector constant.
pub fn index_constant(c: &Constant, i: usize) -> Option<Constant> {
    match &c.ty {
        Type::Array(..) => c.array_element(i).cloned(),
        Type::Matrix { rows, columns, .. } => {
            if i >= *columns as usize {
                return None;
            }
            let rows = *rows as usize;
            let column: Vec<ScalarValue> = (0..rows)
                .map(|r| c.component(i * rows + r))
                .collect::<Option<_>>()?;
            Constant::from_scalars(c.ty.index_result()?, &column)
        }
        Type::Vector(..) => {
            let v = c.component(i)?;
            Constant::from_scalars(c.ty.index_result()?, &[v])
        }
        _ => None,
    }
}

fn pick(values: &[ScalarValue], i: usize, n: usize) -> Option<ScalarValue> {
    match values.len() {
        1 => Some(values[0]),
        len if len == n => values.get(i).copied(),
        _ => None,
    }
}

/// Matrix-vector and matrix-matrix products are not component-wise.
fn is_linear_algebra(operands: &[&Constant]) -> bool {
    let a = &operands[0].ty;
    let b = &operands[1].ty;
    (a.is_matrix() && !b.is_scalar()) || (b.is_matrix() && !a.is_scalar())
}

fn dot(a: &[ScalarValue], b: &[ScalarValue]) -> Option<ScalarValue> {
    if a.len() != b.len() {
        return None;
    }
    let mut acc: Option<ScalarValue> = None;
    for (x, y) in a.iter().zip(b) {
        let p = binary(ExprOp::Mul, *x, *y)?;
        acc = Some(match acc {
            Some(s) => binary(ExprOp::Add, s, p)?,
            None => p,
        });
    }
    acc
}

fn unary(op: ExprOp, a: ScalarValue, out: BaseType) -> Option<ScalarValue> {
    use ExprOp::*;
    use ScalarValue as S;

    if op.is_conversion() || matches!(op, D2f | F2d | D2i | I2d | D2u | U2d | D2b) {
        return Some(a.convert(out));
    }
    Some(match (op, a) {
        (Neg, S::Int(x)) => S::Int(x.wrapping_neg()),
        (Neg, S::UInt(x)) => S::UInt(x.wrapping_neg()),
        (Abs, S::Int(x)) => S::Int(x.wrapping_abs()),
        (Sign, S::Int(x)) => S::Int(x.signum()),
        (BitNot, S::Int(x)) => S::Int(!x),
        (BitNot, S::UInt(x)) => S::UInt(!x),
        (LogicNot, S::Bool(b)) => S::Bool(!b),
        (BitcastF2i, S::Float(x)) => S::Int(x.to_bits() as i32),
        (BitcastF2u, S::Float(x)) => S::UInt(x.to_bits()),
        (BitcastI2f, S::Int(x)) => S::Float(f32::from_bits(x as u32)),
        (BitcastU2f, S::UInt(x)) => S::Float(f32::from_bits(x)),
        (BitCount, S::Int(x)) => S::Int(x.count_ones() as i32),
        (BitCount, S::UInt(x)) => S::Int(x.count_ones() as i32),
        (BitfieldReverse, S::Int(x)) => S::Int(x.reverse_bits()),
        (BitfieldReverse, S::UInt(x)) => S::UInt(x.reverse_bits()),
        (FindLsb, S::Int(x)) => S::Int(find_lsb(x as u32)),
        (FindLsb, S::UInt(x)) => S::Int(find_lsb(x)),
        (FindMsb, S::Int(x)) => S::Int(find_msb(if x < 0 { !x as u32 } else { x as u32 })),
        (FindMsb, S::UInt(x)) => S::Int(find_msb(x)),
        (Dfdx | DfdxCoarse | DfdxFine | Dfdy | DfdyCoarse | DfdyFine, S::Float(_)) => {
            S::Float(0.0)
        }
        (op, S::Float(x)) => S::Float(float_unary_f32(op, x)?),
        (op, S::Double(x)) => S::Double(float_unary_f64(op, x)?),
        _ => return None,
    })
}

fn find_lsb(x: u32) -> i32 {
    if x == 0 {
        -1
    } else {
        x.trailing_zeros() as i32
    }
}

fn find_msb(x: u32) -> i32 {
    if x == 0 {
        -1
    } else {
        31 - x.leading_zeros() as i32
    }
}

fn float_unary_f32(op: ExprOp, x: f32) -> Option<f32> {
    use ExprOp::*;
    Some(match op {
        Neg => -x,
        Abs => libm::fabsf(x),
        Sign => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Rcp => 1.0 / x,
        Rsq => 1.0 / libm::sqrtf(x),
        Sqrt => libm::sqrtf(x),
        Exp => libm::expf(x),
        Log => libm::logf(x),
        Exp2 => libm::exp2f(x),
        Log2 => libm::log2f(x),
        Trunc => libm::truncf(x),
        Ceil => libm::ceilf(x),
        Floor => libm::floorf(x),
        Fract => x - libm::floorf(x),
        RoundEven => libm::rintf(x),
        Sin => libm::sinf(x),
        Cos => libm::cosf(x),
        Atan => libm::atanf(x),
        Saturate => x.clamp(0.0, 1.0),
        _ => return None,
    })
}

fn float_unary_f64(op: ExprOp, x: f64) -> Option<f64> {
    use ExprOp::*;
    Some(match op {
        Neg => -x,
        Abs => libm::fabs(x),
        Sign => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Rcp => 1.0 / x,
        Rsq => 1.0 / libm::sqrt(x),
        Sqrt => libm::sqrt(x),
        Exp => libm::exp(x),
        Log => libm::log(x),
        Exp2 => libm::exp2(x),
        Log2 => libm::log2(x),
        Trunc => libm::trunc(x),
        Ceil => libm::ceil(x),
        Floor => libm::floor(x),
        Fract => x - libm::floor(x),
        RoundEven => libm::rint(x),
        Sin => libm::sin(x),
        Cos => libm::cos(x),
        Atan => libm::atan(x),
        Saturate => x.clamp(0.0, 1.0),
        _ => return None,
    })
}

fn compare(a: ScalarValue, b: ScalarValue) -> Option<Ordering> {
    use ScalarValue as S;
    match (a, b) {
        (S::Float(x), S::Float(y)) => x.partial_cmp(&y),
        (S::Double(x), S::Double(y)) => x.partial_cmp(&y),
        (S::Int(x), S::Int(y)) => Some(x.cmp(&y)),
        (S::UInt(x), S::UInt(y)) => Some(x.cmp(&y)),
        _ => None,
    }
}

fn binary(op: ExprOp, a: ScalarValue, b: ScalarValue) -> Option<ScalarValue> {
    use ExprOp::*;
    use ScalarValue as S;

    match op {
        Less => return Some(S::Bool(compare(a, b)? == Ordering::Less)),
        Gequal => return Some(S::Bool(compare(a, b)? != Ordering::Less)),
        Equal => return Some(S::Bool(a == b)),
        Nequal => return Some(S::Bool(a != b)),
        Lshift | Rshift => {
            let amount = (b.as_i64() & 31) as u32;
            return match (op, a) {
                (Lshift, S::Int(x)) => Some(S::Int(x.wrapping_shl(amount))),
                (Rshift, S::Int(x)) => Some(S::Int(x.wrapping_shr(amount))),
                (Lshift, S::UInt(x)) => Some(S::UInt(x.wrapping_shl(amount))),
                (Rshift, S::UInt(x)) => Some(S::UInt(x.wrapping_shr(amount))),
                _ => None,
            };
        }
        _ => {}
    }
    Some(match (a, b) {
        (S::Float(x), S::Float(y)) => S::Float(float_binary_f32(op, x, y)?),
        (S::Double(x), S::Double(y)) => S::Double(float_binary_f64(op, x, y)?),
        (S::Int(x), S::Int(y)) => S::Int(int_binary(op, x, y)?),
        (S::UInt(x), S::UInt(y)) => S::UInt(uint_binary(op, x, y)?),
        (S::Bool(x), S::Bool(y)) => S::Bool(match op {
            LogicAnd => x && y,
            LogicOr => x || y,
            LogicXor => x != y,
            _ => return None,
        }),
        (S::Float(x), S::Int(e)) if op == Ldexp => S::Float(libm::ldexpf(x, e)),
        (S::Double(x), S::Int(e)) if op == Ldexp => S::Double(libm::ldexp(x, e)),
        _ => return None,
    })
}

fn float_binary_f32(op: ExprOp, x: f32, y: f32) -> Option<f32> {
    use ExprOp::*;
    Some(match op {
        Add => x + y,
        Sub => x - y,
        Mul => x * y,
        Div => x / y,
        Mod => x - y * libm::floorf(x / y),
        Min => libm::fminf(x, y),
        Max => libm::fmaxf(x, y),
        Pow => libm::powf(x, y),
        Atan2 => libm::atan2f(x, y),
        _ => return None,
    })
}

fn float_binary_f64(op: ExprOp, x: f64, y: f64) -> Option<f64> {
    use ExprOp::*;
    Some(match op {
        Add => x + y,
        Sub => x - y,
        Mul => x * y,
        Div => x / y,
        Mod => x - y * libm::floor(x / y),
        Min => libm::fmin(x, y),
        Max => libm::fmax(x, y),
        Pow => libm::pow(x, y),
        Atan2 => libm::atan2(x, y),
        _ => return None,
    })
}

fn int_binary(op: ExprOp, x: i32, y: i32) -> Option<i32> {
    use ExprOp::*;
    Some(match op {
        Add => x.wrapping_add(y),
        Sub => x.wrapping_sub(y),
        Mul => x.wrapping_mul(y),
        ImulHigh => ((x as i64 * y as i64) >> 32) as i32,
        Div if y != 0 => x.wrapping_div(y),
        Mod if y != 0 => x.wrapping_rem(y),
        Min => x.min(y),
        Max => x.max(y),
        BitAnd => x & y,
        BitOr => x | y,
        BitXor => x ^ y,
        _ => return None,
    })
}

fn uint_binary(op: ExprOp, x: u32, y: u32) -> Option<u32> {
    use ExprOp::*;
    Some(match op {
        Add => x.wrapping_add(y),
        Sub => x.wrapping_sub(y),
        Mul => x.wrapping_mul(y),
        ImulHigh => ((x as u64 * y as u64) >> 32) as u32,
        Carry => ((x as u64 + y as u64) >> 32) as u32,
        Borrow => (x < y) as u32,
        Div if y != 0 => x / y,
        Mod if y != 0 => x % y,
        Min => x.min(y),
        Max => x.max(y),
        BitAnd => x & y,
        BitOr => x | y,
        BitXor => x ^ y,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glopt_ir::ConstantData;

    fn vec3(x: f32, y: f32, z: f32) -> Constant {
        Constant {
            ty: Type::Vector(BaseType::Float, 3),
            data: ConstantData::Float(vec![x, y, z]),
        }
    }

    #[test]
    fn test_scalar_arithmetic() {
        let c = evaluate(
            ExprOp::Add,
            &Type::INT,
            &[&Constant::int(2), &Constant::int(3)],
        );
        assert_eq!(c, Some(Constant::int(5)));
        let c = evaluate(
            ExprOp::Mul,
            &Type::FLOAT,
            &[&Constant::float(1.5), &Constant::float(2.0)],
        );
        assert_eq!(c, Some(Constant::float(3.0)));
    }

    #[test]
    fn test_integer_division_by_zero_not_folded() {
        assert!(evaluate(
            ExprOp::Div,
            &Type::INT,
            &[&Constant::int(1), &Constant::int(0)]
        )
        .is_none());
        assert!(evaluate(
            ExprOp::Mod,
            &Type::UINT,
            &[&Constant::uint(1), &Constant::uint(0)]
        )
        .is_none());
    }

    #[test]
    fn test_scalar_broadcast() {
        let c = evaluate(
            ExprOp::Mul,
            &Type::Vector(BaseType::Float, 3),
            &[&vec3(1.0, 2.0, 3.0), &Constant::float(2.0)],
        );
        assert_eq!(c, Some(vec3(2.0, 4.0, 6.0)));
    }

    #[test]
    fn test_dot_and_comparisons() {
        let d = evaluate(
            ExprOp::Dot,
            &Type::FLOAT,
            &[&vec3(1.0, 2.0, 3.0), &vec3(1.0, 1.0, 1.0)],
        );
        assert_eq!(d, Some(Constant::float(6.0)));
        let lt = evaluate(
            ExprOp::Less,
            &Type::BOOL,
            &[&Constant::int(1), &Constant::int(2)],
        );
        assert_eq!(lt, Some(Constant::bool(true)));
        let nan = evaluate(
            ExprOp::Less,
            &Type::BOOL,
            &[&Constant::float(f32::NAN), &Constant::float(2.0)],
        );
        assert_eq!(nan, None);
        let eq = evaluate(
            ExprOp::AllEqual,
            &Type::BOOL,
            &[&vec3(1.0, 2.0, 3.0), &vec3(1.0, 2.0, 3.0)],
        );
        assert_eq!(eq, Some(Constant::bool(true)));
    }

    #[test]
    fn test_conversions_and_bits() {
        assert_eq!(
            evaluate(ExprOp::F2i, &Type::INT, &[&Constant::float(2.75)]),
            Some(Constant::int(2))
        );
        assert_eq!(
            evaluate(ExprOp::BitcastF2u, &Type::UINT, &[&Constant::float(1.0)]),
            Some(Constant::uint(0x3f80_0000))
        );
        assert_eq!(
            evaluate(ExprOp::FindMsb, &Type::INT, &[&Constant::int(0)]),
            Some(Constant::int(-1))
        );
        assert_eq!(
            evaluate(ExprOp::FindLsb, &Type::INT, &[&Constant::uint(8)]),
            Some(Constant::int(3))
        );
    }

    #[test]
    fn test_matrix_product_not_folded() {
        let m = Constant::splat(
            Type::Matrix {
                base: BaseType::Float,
                columns: 3,
                rows: 3,
            },
            ScalarValue::Float(1.0),
        )
        .unwrap();
        assert!(evaluate(
            ExprOp::Mul,
            &Type::Vector(BaseType::Float, 3),
            &[&m, &vec3(1.0, 2.0, 3.0)]
        )
        .is_none());
    }

    #[test]
    fn test_fold_nested_tree() {
        let mut rv = Rvalue::binop(
            ExprOp::Add,
            Type::FLOAT,
            Rvalue::constant(Constant::float(2.0)),
            Rvalue::binop(
                ExprOp::Mul,
                Type::FLOAT,
                Rvalue::constant(Constant::float(3.0)),
                Rvalue::constant(Constant::float(4.0)),
            ),
        );
        assert!(fold_rvalue(&mut rv));
        assert_eq!(rv, Rvalue::constant(Constant::float(14.0)));
        assert!(!fold_rvalue(&mut rv));
    }

    #[test]
    fn test_swizzle_and_index() {
        let v = vec3(1.0, 2.0, 3.0);
        let zx = swizzle_constant(&v, &SwizzleMask::parse("zx").unwrap()).unwrap();
        assert_eq!(zx.components(), vec![ScalarValue::Float(3.0), ScalarValue::Float(1.0)]);
        assert_eq!(index_constant(&v, 1), Some(Constant::float(2.0)));
        assert_eq!(index_constant(&v, 3), None);
    }
}
