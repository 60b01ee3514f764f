//! Type system for the IR.
//!
//! Mirrors the shading language's own types: scalars, vectors, matrices,
//! arrays, structures and samplers.

use alloc::{boxed::Box, format, string::String, vec::Vec};
use core::fmt;

/// Component type of a scalar, vector or matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    /// 32-bit unsigned integer
    UInt,
    /// 32-bit signed integer
    Int,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    /// Boolean
    Bool,
}

impl BaseType {
    /// Check if this is a signed or unsigned integer type.
    pub fn is_integer(self) -> bool {
        matches!(self, BaseType::UInt | BaseType::Int)
    }

    /// Check if this is a floating point type.
    pub fn is_float(self) -> bool {
        matches!(self, BaseType::Float | BaseType::Double)
    }

    /// Scalar type name.
    pub fn scalar_name(self) -> &'static str {
        match self {
            BaseType::UInt => "uint",
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::Bool => "bool",
        }
    }

    /// Prefix used by vector type names (`vec`, `ivec`, ...).
    pub fn vector_prefix(self) -> &'static str {
        match self {
            BaseType::UInt => "uvec",
            BaseType::Int => "ivec",
            BaseType::Float => "vec",
            BaseType::Double => "dvec",
            BaseType::Bool => "bvec",
        }
    }
}

/// Sampler dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerDim {
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
    Rect,
    Buf,
    External,
    Ms,
}

impl SamplerDim {
    /// Number of coordinate components addressing a texel, excluding
    /// array layer and shadow reference.
    pub fn coordinate_components(self) -> u8 {
        match self {
            SamplerDim::Dim1D | SamplerDim::Buf => 1,
            SamplerDim::Dim2D | SamplerDim::Rect | SamplerDim::External | SamplerDim::Ms => 2,
            SamplerDim::Dim3D | SamplerDim::Cube => 3,
        }
    }

    /// Suffix used by sampler type names (`sampler2DRect`).
    pub fn type_suffix(self) -> &'static str {
        match self {
            SamplerDim::Dim1D => "1D",
            SamplerDim::Dim2D => "2D",
            SamplerDim::Dim3D => "3D",
            SamplerDim::Cube => "Cube",
            SamplerDim::Rect => "2DRect",
            SamplerDim::Buf => "Buffer",
            SamplerDim::External => "ExternalOES",
            SamplerDim::Ms => "2DMS",
        }
    }

    /// Suffix used by pre-1.30 texture builtin names (`texture2DRect`).
    pub fn legacy_function_suffix(self) -> &'static str {
        match self {
            SamplerDim::Dim1D => "1D",
            SamplerDim::Dim2D => "2D",
            SamplerDim::Dim3D => "3D",
            SamplerDim::Cube => "Cube",
            SamplerDim::Rect => "Rect",
            SamplerDim::Buf => "Buf",
            SamplerDim::External => "External",
            SamplerDim::Ms => "2DMS",
        }
    }
}

/// Opaque sampler type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerType {
    pub dim: SamplerDim,
    pub shadow: bool,
    pub array: bool,
    /// Type of the sampled texel components
    pub base: BaseType,
}

impl SamplerType {
    /// Plain float sampler of the given dimensionality.
    pub fn new(dim: SamplerDim) -> Self {
        Self {
            dim,
            shadow: false,
            array: false,
            base: BaseType::Float,
        }
    }

    /// Type name, e.g. `sampler2DArrayShadow` or `usampler3D`.
    pub fn name(&self) -> String {
        let prefix = match self.base {
            BaseType::Int => "i",
            BaseType::UInt => "u",
            _ => "",
        };
        format!(
            "{}sampler{}{}{}",
            prefix,
            self.dim.type_suffix(),
            if self.array { "Array" } else { "" },
            if self.shadow { "Shadow" } else { "" }
        )
    }
}

/// A named structure field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

/// A user or builtin structure type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructType {
    /// Find a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A type in the IR.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// No value (function return type only)
    Void,
    /// Single component
    Scalar(BaseType),
    /// Vector with 2 to 4 components
    Vector(BaseType, u8),
    /// Column-major matrix
    Matrix { base: BaseType, columns: u8, rows: u8 },
    /// Fixed-size array
    Array(Box<Type>, u32),
    /// Structure
    Struct(StructType),
    /// Opaque sampler
    Sampler(SamplerType),
}

impl Type {
    pub const FLOAT: Type = Type::Scalar(BaseType::Float);
    pub const INT: Type = Type::Scalar(BaseType::Int);
    pub const UINT: Type = Type::Scalar(BaseType::UInt);
    pub const BOOL: Type = Type::Scalar(BaseType::Bool);

    /// Scalar or vector of `base` with `components` components.
    ///
    /// One component yields a scalar.
    pub fn vector(base: BaseType, components: u8) -> Type {
        if components <= 1 {
            Type::Scalar(base)
        } else {
            Type::Vector(base, components)
        }
    }

    /// Array of `element` with `size` elements.
    pub fn array(element: Type, size: u32) -> Type {
        Type::Array(Box::new(element), size)
    }

    /// Component type of a scalar, vector or matrix.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Type::Scalar(b) | Type::Vector(b, _) => Some(*b),
            Type::Matrix { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Number of rows (components per column); 0 for non-numeric types.
    pub fn vector_elements(&self) -> u8 {
        match self {
            Type::Scalar(_) => 1,
            Type::Vector(_, n) => *n,
            Type::Matrix { rows, .. } => *rows,
            _ => 0,
        }
    }

    /// Number of columns; 1 for scalars and vectors, 0 for non-numeric types.
    pub fn matrix_columns(&self) -> u8 {
        match self {
            Type::Scalar(_) | Type::Vector(..) => 1,
            Type::Matrix { columns, .. } => *columns,
            _ => 0,
        }
    }

    /// Total number of components of a scalar, vector or matrix.
    pub fn components(&self) -> u32 {
        self.vector_elements() as u32 * self.matrix_columns() as u32
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Scalar(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(..))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Matrix { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self, Type::Sampler(_))
    }

    /// Scalar, vector or matrix.
    pub fn is_numeric(&self) -> bool {
        self.base_type().is_some()
    }

    /// Scalar or vector of booleans.
    pub fn is_boolean(&self) -> bool {
        self.base_type() == Some(BaseType::Bool)
    }

    /// Scalar, vector or matrix of float or double.
    pub fn is_float(&self) -> bool {
        self.base_type().map_or(false, BaseType::is_float)
    }

    /// Scalar or vector of int or uint.
    pub fn is_integer(&self) -> bool {
        self.base_type().map_or(false, BaseType::is_integer)
    }

    /// Element count of an array type.
    pub fn array_size(&self) -> Option<u32> {
        match self {
            Type::Array(_, n) => Some(*n),
            _ => None,
        }
    }

    /// Element type of an array type.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem, _) => Some(elem),
            _ => None,
        }
    }

    /// Type produced by indexing a value of this type: the element of an
    /// array, a column of a matrix, or a component of a vector.
    pub fn index_result(&self) -> Option<Type> {
        match self {
            Type::Array(elem, _) => Some((**elem).clone()),
            Type::Matrix { base, rows, .. } => Some(Type::vector(*base, *rows)),
            Type::Vector(base, _) => Some(Type::Scalar(*base)),
            _ => None,
        }
    }

    /// Same base type with a different component count.
    pub fn with_components(&self, components: u8) -> Option<Type> {
        match self {
            Type::Scalar(b) | Type::Vector(b, _) => Some(Type::vector(*b, components)),
            _ => None,
        }
    }

    /// Same shape with a different base type.
    pub fn with_base(&self, base: BaseType) -> Option<Type> {
        match self {
            Type::Scalar(_) => Some(Type::Scalar(base)),
            Type::Vector(_, n) => Some(Type::Vector(base, *n)),
            Type::Matrix { columns, rows, .. } => Some(Type::Matrix {
                base,
                columns: *columns,
                rows: *rows,
            }),
            _ => None,
        }
    }

    /// Type name without array dimensions.
    ///
    /// For arrays, returns the name of the innermost element type.
    pub fn name(&self) -> String {
        match self {
            Type::Void => String::from("void"),
            Type::Scalar(b) => String::from(b.scalar_name()),
            Type::Vector(b, n) => format!("{}{}", b.vector_prefix(), n),
            Type::Matrix {
                base,
                columns,
                rows,
            } => {
                let prefix = if *base == BaseType::Double { "dmat" } else { "mat" };
                if columns == rows {
                    format!("{}{}", prefix, columns)
                } else {
                    format!("{}{}x{}", prefix, columns, rows)
                }
            }
            Type::Array(elem, _) => elem.name(),
            Type::Struct(s) => s.name.clone(),
            Type::Sampler(s) => s.name(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Array(elem, n) => write!(f, "{}[{}]", elem, n),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Type::FLOAT.name(), "float");
        assert_eq!(Type::Vector(BaseType::Int, 3).name(), "ivec3");
        assert_eq!(Type::Vector(BaseType::Bool, 2).name(), "bvec2");
        assert_eq!(
            Type::Matrix {
                base: BaseType::Float,
                columns: 4,
                rows: 4
            }
            .name(),
            "mat4"
        );
        assert_eq!(
            Type::Matrix {
                base: BaseType::Float,
                columns: 2,
                rows: 3
            }
            .name(),
            "mat2x3"
        );
        assert_eq!(Type::array(Type::FLOAT, 4).to_string(), "float[4]");
    }

    #[test]
    fn test_sampler_names() {
        let mut s = SamplerType::new(SamplerDim::Dim2D);
        assert_eq!(s.name(), "sampler2D");
        s.array = true;
        s.shadow = true;
        assert_eq!(s.name(), "sampler2DArrayShadow");
        let u = SamplerType {
            dim: SamplerDim::Dim3D,
            shadow: false,
            array: false,
            base: BaseType::UInt,
        };
        assert_eq!(u.name(), "usampler3D");
    }

    #[test]
    fn test_component_counts() {
        let m = Type::Matrix {
            base: BaseType::Float,
            columns: 3,
            rows: 2,
        };
        assert_eq!(m.vector_elements(), 2);
        assert_eq!(m.matrix_columns(), 3);
        assert_eq!(m.components(), 6);
        assert_eq!(m.index_result(), Some(Type::Vector(BaseType::Float, 2)));
        assert_eq!(Type::array(Type::INT, 2).components(), 0);
    }

    #[test]
    fn test_vector_constructor_collapses_to_scalar() {
        assert_eq!(Type::vector(BaseType::Float, 1), Type::FLOAT);
        assert_eq!(
            Type::vector(BaseType::Float, 3),
            Type::Vector(BaseType::Float, 3)
        );
        assert_eq!(
            Type::Vector(BaseType::Float, 4).with_base(BaseType::Int),
            Some(Type::Vector(BaseType::Int, 4))
        );
    }

    #[test]
    fn test_struct_field_lookup() {
        let s = StructType {
            name: "Light".to_string(),
            fields: vec![
                StructField {
                    name: "color".to_string(),
                    ty: Type::Vector(BaseType::Float, 3),
                },
                StructField {
                    name: "power".to_string(),
                    ty: Type::FLOAT,
                },
            ],
        };
        assert_eq!(s.field_index("power"), Some(1));
        assert_eq!(s.field_index("missing"), None);
    }
}
