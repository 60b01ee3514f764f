//! GLSL type specifiers to IR types.

use alloc::{format, vec::Vec};

use glopt_ir::{BaseType, SamplerDim, SamplerType, SwizzleMask, Type};
use glsl::syntax::TypeSpecifierNonArray;

use crate::{
    error::{GlslError, GlslResult},
    symbols::SymbolTable,
};

/// IR type of a type specifier without array dimensions.
///
/// Structure specifiers must have been registered with `symbols` first.
pub fn non_array_type(spec: &TypeSpecifierNonArray, symbols: &SymbolTable) -> GlslResult<Type> {
    use BaseType::*;
    use TypeSpecifierNonArray as T;

    let ty = match spec {
        T::Void => Type::Void,
        T::Bool => Type::BOOL,
        T::Int => Type::INT,
        T::UInt => Type::UINT,
        T::Float => Type::FLOAT,
        T::Double => Type::Scalar(Double),
        T::Vec2 => Type::Vector(Float, 2),
        T::Vec3 => Type::Vector(Float, 3),
        T::Vec4 => Type::Vector(Float, 4),
        T::DVec2 => Type::Vector(Double, 2),
        T::DVec3 => Type::Vector(Double, 3),
        T::DVec4 => Type::Vector(Double, 4),
        T::BVec2 => Type::Vector(Bool, 2),
        T::BVec3 => Type::Vector(Bool, 3),
        T::BVec4 => Type::Vector(Bool, 4),
        T::IVec2 => Type::Vector(Int, 2),
        T::IVec3 => Type::Vector(Int, 3),
        T::IVec4 => Type::Vector(Int, 4),
        T::UVec2 => Type::Vector(UInt, 2),
        T::UVec3 => Type::Vector(UInt, 3),
        T::UVec4 => Type::Vector(UInt, 4),
        T::Mat2 => matrix(Float, 2, 2),
        T::Mat3 => matrix(Float, 3, 3),
        T::Mat4 => matrix(Float, 4, 4),
        T::Mat23 => matrix(Float, 2, 3),
        T::Mat24 => matrix(Float, 2, 4),
        T::Mat32 => matrix(Float, 3, 2),
        T::Mat34 => matrix(Float, 3, 4),
        T::Mat42 => matrix(Float, 4, 2),
        T::Mat43 => matrix(Float, 4, 3),
        T::DMat2 => matrix(Double, 2, 2),
        T::DMat3 => matrix(Double, 3, 3),
        T::DMat4 => matrix(Double, 4, 4),
        T::Sampler1D => sampler(SamplerDim::Dim1D, Float, false, false),
        T::Sampler2D => sampler(SamplerDim::Dim2D, Float, false, false),
        T::Sampler3D => sampler(SamplerDim::Dim3D, Float, false, false),
        T::SamplerCube => sampler(SamplerDim::Cube, Float, false, false),
        T::Sampler2DRect => sampler(SamplerDim::Rect, Float, false, false),
        T::Sampler1DArray => sampler(SamplerDim::Dim1D, Float, true, false),
        T::Sampler2DArray => sampler(SamplerDim::Dim2D, Float, true, false),
        T::SamplerBuffer => sampler(SamplerDim::Buf, Float, false, false),
        T::Sampler2DMS => sampler(SamplerDim::Ms, Float, false, false),
        T::Sampler1DShadow => sampler(SamplerDim::Dim1D, Float, false, true),
        T::Sampler2DShadow => sampler(SamplerDim::Dim2D, Float, false, true),
        T::Sampler2DRectShadow => sampler(SamplerDim::Rect, Float, false, true),
        T::Sampler1DArrayShadow => sampler(SamplerDim::Dim1D, Float, true, true),
        T::Sampler2DArrayShadow => sampler(SamplerDim::Dim2D, Float, true, true),
        T::SamplerCubeShadow => sampler(SamplerDim::Cube, Float, false, true),
        T::ISampler2D => sampler(SamplerDim::Dim2D, Int, false, false),
        T::ISampler3D => sampler(SamplerDim::Dim3D, Int, false, false),
        T::ISamplerCube => sampler(SamplerDim::Cube, Int, false, false),
        T::USampler2D => sampler(SamplerDim::Dim2D, UInt, false, false),
        T::USampler3D => sampler(SamplerDim::Dim3D, UInt, false, false),
        T::USamplerCube => sampler(SamplerDim::Cube, UInt, false, false),
        T::TypeName(name) => named_type(&name.0, symbols)?,
        T::Struct(s) => {
            let name = s
                .name
                .as_ref()
                .ok_or_else(|| GlslError::unsupported("anonymous structure type"))?;
            named_type(&name.0, symbols)?
        }
        other => return Err(GlslError::unsupported(format!("type {:?}", other))),
    };
    Ok(ty)
}

fn named_type(name: &str, symbols: &SymbolTable) -> GlslResult<Type> {
    if let Some(st) = symbols.lookup_struct(name) {
        return Ok(Type::Struct(st.clone()));
    }
    type_from_name(name).ok_or_else(|| GlslError::type_error(format!("unknown type '{}'", name)))
}

fn matrix(base: BaseType, columns: u8, rows: u8) -> Type {
    Type::Matrix {
        base,
        columns,
        rows,
    }
}

fn sampler(dim: SamplerDim, base: BaseType, array: bool, shadow: bool) -> Type {
    Type::Sampler(SamplerType {
        dim,
        shadow,
        array,
        base,
    })
}

/// Scalar, vector and matrix type named by a constructor identifier.
pub fn type_from_name(name: &str) -> Option<Type> {
    use BaseType::*;

    let scalar = match name {
        "float" => Some(Float),
        "int" => Some(Int),
        "uint" => Some(UInt),
        "bool" => Some(Bool),
        "double" => Some(Double),
        _ => None,
    };
    if let Some(base) = scalar {
        return Some(Type::Scalar(base));
    }
    for (prefix, base) in [
        ("vec", Float),
        ("ivec", Int),
        ("uvec", UInt),
        ("bvec", Bool),
        ("dvec", Double),
    ] {
        if let Some(n) = name.strip_prefix(prefix) {
            return dimension(n).map(|n| Type::Vector(base, n));
        }
    }
    for (prefix, base) in [("mat", Float), ("dmat", Double)] {
        if let Some(dims) = name.strip_prefix(prefix) {
            let (c, r) = dims.split_once('x').unwrap_or((dims, dims));
            return Some(matrix(base, dimension(c)?, dimension(r)?));
        }
    }
    None
}

fn dimension(s: &str) -> Option<u8> {
    match s {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

/// Swizzle mask for a field selection such as `.xzy` or `.rg`.
///
/// Letters must come from one naming set and stay within `available`
/// components.
pub fn parse_swizzle(field: &str, available: u8) -> Option<SwizzleMask> {
    const SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];
    let set = SETS
        .iter()
        .find(|set| !field.is_empty() && field.chars().all(|c| set.contains(c)))?;
    let components: Vec<u8> = field
        .chars()
        .map(|c| set.find(c).map(|i| i as u8))
        .collect::<Option<_>>()?;
    if components.iter().any(|c| *c >= available.max(1)) {
        return None;
    }
    SwizzleMask::new(&components)
}

/// Base type both operands convert to implicitly, if any.
pub fn common_base(a: BaseType, b: BaseType) -> Option<BaseType> {
    if a == b {
        return Some(a);
    }
    if implicitly_converts(a, b) {
        Some(b)
    } else if implicitly_converts(b, a) {
        Some(a)
    } else {
        None
    }
}

/// Implicit conversion from `from` to `to` (int and uint widen to float,
/// every numeric type widens to double).
pub fn implicitly_converts(from: BaseType, to: BaseType) -> bool {
    use BaseType::*;
    matches!(
        (from, to),
        (Int, Float) | (UInt, Float) | (Int, Double) | (UInt, Double) | (Float, Double)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_name() {
        assert_eq!(type_from_name("vec3"), Some(Type::Vector(BaseType::Float, 3)));
        assert_eq!(type_from_name("uvec2"), Some(Type::Vector(BaseType::UInt, 2)));
        assert_eq!(type_from_name("mat3"), Some(matrix(BaseType::Float, 3, 3)));
        assert_eq!(
            type_from_name("mat2x4"),
            Some(matrix(BaseType::Float, 2, 4))
        );
        assert_eq!(type_from_name("dmat4"), Some(matrix(BaseType::Double, 4, 4)));
        assert_eq!(type_from_name("vec5"), None);
        assert_eq!(type_from_name("normalize"), None);
    }

    #[test]
    fn test_specifiers() {
        let symbols = SymbolTable::new();
        assert_eq!(
            non_array_type(&TypeSpecifierNonArray::Mat23, &symbols).unwrap(),
            matrix(BaseType::Float, 2, 3)
        );
        let Type::Sampler(s) =
            non_array_type(&TypeSpecifierNonArray::Sampler2DArrayShadow, &symbols).unwrap()
        else {
            panic!("expected a sampler");
        };
        assert!(s.array && s.shadow);
        assert_eq!(s.name(), "sampler2DArrayShadow");
    }

    #[test]
    fn test_swizzles() {
        let m = parse_swizzle("zyx", 3).unwrap();
        assert_eq!(m.letters(), "zyx");
        assert_eq!(parse_swizzle("rgba", 4).map(|m| m.letters()).as_deref(), Some("xyzw"));
        assert_eq!(parse_swizzle("xxxx", 1).map(|m| m.count), Some(4));
        assert!(parse_swizzle("xz", 2).is_none());
        assert!(parse_swizzle("xr", 4).is_none());
        assert!(parse_swizzle("length", 4).is_none());
    }

    #[test]
    fn test_implicit_conversions() {
        assert_eq!(common_base(BaseType::Int, BaseType::Float), Some(BaseType::Float));
        assert_eq!(common_base(BaseType::Float, BaseType::UInt), Some(BaseType::Float));
        assert_eq!(common_base(BaseType::Int, BaseType::UInt), None);
        assert_eq!(common_base(BaseType::Bool, BaseType::Float), None);
    }
}
