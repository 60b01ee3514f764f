//! Constant literals.
//!
//! Finite floats print with the shortest digits that read back to the same
//! bits. Non-finite floats have no literal form and print as a bit-pattern
//! reinterpretation where the target has one, otherwise as a division that
//! evaluates to the value.

use alloc::{
    format,
    string::{String, ToString},
};

use glopt_ir::{Constant, ConstantData, Target};

use super::Printer;

impl Printer<'_> {
    pub(super) fn constant(&mut self, c: &Constant) {
        let text = constant_text(c, self.target);
        self.push(&text);
    }
}

/// Source text of a constant for `target`.
pub(crate) fn constant_text(c: &Constant, target: &Target) -> String {
    if c.ty.is_scalar() {
        if let Some(text) = scalar_text(&c.data, 0, target, true) {
            return text;
        }
    }

    let mut out = c.ty.to_string();
    out.push('(');
    match &c.data {
        ConstantData::Array(elems) | ConstantData::Struct(elems) => {
            for (i, e) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&constant_text(e, target));
            }
        }
        _ => {
            for i in 0..c.component_count() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(text) = scalar_text(&c.data, i, target, false) {
                    out.push_str(&text);
                }
            }
        }
    }
    out.push(')');
    out
}

fn scalar_text(data: &ConstantData, i: usize, target: &Target, alone: bool) -> Option<String> {
    let text = match data {
        ConstantData::Float(v) => float_text(*v.get(i)?, target),
        ConstantData::Double(v) => double_text(*v.get(i)?),
        ConstantData::Int(v) => int_literal(*v.get(i)?),
        ConstantData::UInt(v) => {
            let u = *v.get(i)?;
            if !target.supports_unsigned_literals() {
                format!("{}", u)
            } else if u == 0 && alone {
                // `0u` alone is read as a signed constant by some drivers.
                String::from("uint(0)")
            } else {
                format!("{}u", u)
            }
        }
        ConstantData::Bool(v) => String::from(if *v.get(i)? { "true" } else { "false" }),
        ConstantData::Array(_) | ConstantData::Struct(_) => return None,
    };
    Some(text)
}

fn float_text(v: f32, target: &Target) -> String {
    if v.is_finite() {
        return float_literal(v);
    }
    if target.supports_bit_encoding() {
        return format!("uintBitsToFloat({}u)", v.to_bits());
    }
    non_finite(v.is_nan(), v > 0.0)
}

fn double_text(v: f64) -> String {
    if !v.is_finite() {
        return non_finite(v.is_nan(), v > 0.0);
    }
    let abs = v.abs();
    let mut s = if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        format!("{:e}", v)
    } else {
        format!("{}", v)
    };
    if !s.contains('.') && !s.contains('e') {
        s.push_str(".0");
    }
    s.push_str("lf");
    s
}

fn non_finite(nan: bool, positive: bool) -> String {
    String::from(match (nan, positive) {
        (true, _) => "(0.0/0.0)",
        (false, true) => "(1.0/0.0)",
        (false, false) => "(-1.0/0.0)",
    })
}

/// Literal for a finite float. Always carries a decimal point or an
/// exponent.
pub(crate) fn float_literal(v: f32) -> String {
    let abs = v.abs();
    let mut s = if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        format!("{:e}", v)
    } else {
        format!("{}", v)
    };
    if !s.contains('.') && !s.contains('e') {
        s.push_str(".0");
    }
    s
}

/// The minimum integer has no positive counterpart to negate, so it prints
/// as a cast of its bit pattern.
fn int_literal(v: i32) -> String {
    if v == i32::MIN {
        String::from("int(0x80000000)")
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{BaseType, ShaderStage, Type};

    use super::*;

    fn old() -> Target {
        Target::new(110, ShaderStage::Fragment)
    }

    fn new() -> Target {
        Target::new(330, ShaderStage::Fragment)
    }

    #[test]
    fn test_float_literals_keep_a_point() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(-2.5), "-2.5");
        assert_eq!(float_literal(0.1), "0.1");
        assert_eq!(float_literal(1e20), "1e20");
        assert_eq!(float_literal(1e-7), "1e-7");
        assert_eq!(float_literal(0.0), "0.0");
    }

    #[test]
    fn test_float_literals_round_trip() {
        for v in [0.1f32, 1.0 / 3.0, 16777217.0, 3.4028235e38, 1.1754944e-38, -7.5e-5] {
            let text = float_literal(v);
            let back: f32 = text.parse().unwrap();
            assert_eq!(back.to_bits(), v.to_bits(), "{}", text);
        }
    }

    #[test]
    fn test_non_finite_without_bit_encoding() {
        assert_eq!(constant_text(&Constant::float(f32::NAN), &old()), "(0.0/0.0)");
        assert_eq!(constant_text(&Constant::float(f32::INFINITY), &old()), "(1.0/0.0)");
        assert_eq!(
            constant_text(&Constant::float(f32::NEG_INFINITY), &old()),
            "(-1.0/0.0)"
        );
    }

    #[test]
    fn test_non_finite_with_bit_encoding() {
        assert_eq!(
            constant_text(&Constant::float(f32::INFINITY), &new()),
            "uintBitsToFloat(2139095040u)"
        );
    }

    #[test]
    fn test_int_min() {
        assert_eq!(constant_text(&Constant::int(i32::MIN), &new()), "int(0x80000000)");
        assert_eq!(constant_text(&Constant::int(-4), &new()), "-4");
    }

    #[test]
    fn test_unsigned_literals() {
        assert_eq!(constant_text(&Constant::uint(7), &old()), "7");
        assert_eq!(constant_text(&Constant::uint(7), &new()), "7u");
        assert_eq!(constant_text(&Constant::uint(0), &new()), "uint(0)");
        let v = Constant {
            ty: Type::Vector(BaseType::UInt, 2),
            data: ConstantData::UInt(vec![0, 3]),
        };
        assert_eq!(constant_text(&v, &new()), "uvec2(0u, 3u)");
    }

    #[test]
    fn test_composites() {
        let v = Constant {
            ty: Type::Vector(BaseType::Float, 3),
            data: ConstantData::Float(vec![1.0, 0.5, 2.0]),
        };
        assert_eq!(constant_text(&v, &old()), "vec3(1.0, 0.5, 2.0)");
        let a = Constant {
            ty: Type::array(Type::INT, 2),
            data: ConstantData::Array(vec![Constant::int(1), Constant::int(2)]),
        };
        assert_eq!(constant_text(&a, &new()), "int[2](1, 2)");
        assert_eq!(constant_text(&Constant::bool(true), &old()), "true");
    }
}
