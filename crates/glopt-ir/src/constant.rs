//! Compile-time constant values.

use alloc::{vec, vec::Vec};

use crate::types::{BaseType, Type};

/// A single component value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Float(f32),
    Double(f64),
    Int(i32),
    UInt(u32),
    Bool(bool),
}

impl ScalarValue {
    pub fn base_type(self) -> BaseType {
        match self {
            ScalarValue::Float(_) => BaseType::Float,
            ScalarValue::Double(_) => BaseType::Double,
            ScalarValue::Int(_) => BaseType::Int,
            ScalarValue::UInt(_) => BaseType::UInt,
            ScalarValue::Bool(_) => BaseType::Bool,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ScalarValue::Float(v) => v as f64,
            ScalarValue::Double(v) => v,
            ScalarValue::Int(v) => v as f64,
            ScalarValue::UInt(v) => v as f64,
            ScalarValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ScalarValue::Float(v) => v as i64,
            ScalarValue::Double(v) => v as i64,
            ScalarValue::Int(v) => v as i64,
            ScalarValue::UInt(v) => v as i64,
            ScalarValue::Bool(v) => v as i64,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            ScalarValue::Float(v) => v != 0.0,
            ScalarValue::Double(v) => v != 0.0,
            ScalarValue::Int(v) => v != 0,
            ScalarValue::UInt(v) => v != 0,
            ScalarValue::Bool(v) => v,
        }
    }

    /// Convert to another base type with the language's constructor rules.
    pub fn convert(self, base: BaseType) -> ScalarValue {
        match base {
            BaseType::Float => ScalarValue::Float(match self {
                ScalarValue::Float(v) => v,
                other => other.as_f64() as f32,
            }),
            BaseType::Double => ScalarValue::Double(self.as_f64()),
            BaseType::Int => ScalarValue::Int(match self {
                ScalarValue::UInt(v) => v as i32,
                other => other.as_i64() as i32,
            }),
            BaseType::UInt => ScalarValue::UInt(match self {
                ScalarValue::Int(v) => v as u32,
                ScalarValue::Float(v) => v as u32,
                ScalarValue::Double(v) => v as u32,
                other => other.as_i64() as u32,
            }),
            BaseType::Bool => ScalarValue::Bool(self.as_bool()),
        }
    }
}

/// Storage for the components of a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantData {
    Float(Vec<f32>),
    Double(Vec<f64>),
    Int(Vec<i32>),
    UInt(Vec<u32>),
    Bool(Vec<bool>),
    /// Array elements
    Array(Vec<Constant>),
    /// Structure fields in declaration order
    Struct(Vec<Constant>),
}

/// A typed constant.
///
/// Matrix components are stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub ty: Type,
    pub data: ConstantData,
}

impl Constant {
    pub fn float(v: f32) -> Self {
        Self {
            ty: Type::FLOAT,
            data: ConstantData::Float(vec![v]),
        }
    }

    pub fn int(v: i32) -> Self {
        Self {
            ty: Type::INT,
            data: ConstantData::Int(vec![v]),
        }
    }

    pub fn uint(v: u32) -> Self {
        Self {
            ty: Type::UINT,
            data: ConstantData::UInt(vec![v]),
        }
    }

    pub fn bool(v: bool) -> Self {
        Self {
            ty: Type::BOOL,
            data: ConstantData::Bool(vec![v]),
        }
    }

    /// Build a scalar, vector or matrix constant from component values,
    /// converting each component to the base type of `ty`.
    ///
    /// Returns `None` when `ty` is not numeric or the component count does
    /// not match.
    pub fn from_scalars(ty: Type, values: &[ScalarValue]) -> Option<Self> {
        let base = ty.base_type()?;
        if values.len() != ty.components() as usize {
            return None;
        }
        let converted = values.iter().map(|v| v.convert(base));
        let data = match base {
            BaseType::Float => ConstantData::Float(
                converted
                    .map(|v| match v {
                        ScalarValue::Float(f) => f,
                        _ => 0.0,
                    })
                    .collect(),
            ),
            BaseType::Double => ConstantData::Double(converted.map(|v| v.as_f64()).collect()),
            BaseType::Int => ConstantData::Int(
                converted
                    .map(|v| match v {
                        ScalarValue::Int(i) => i,
                        _ => 0,
                    })
                    .collect(),
            ),
            BaseType::UInt => ConstantData::UInt(
                converted
                    .map(|v| match v {
                        ScalarValue::UInt(u) => u,
                        _ => 0,
                    })
                    .collect(),
            ),
            BaseType::Bool => ConstantData::Bool(converted.map(|v| v.as_bool()).collect()),
        };
        Some(Self { ty, data })
    }

    /// Constant with every component set to `value`.
    pub fn splat(ty: Type, value: ScalarValue) -> Option<Self> {
        let values = vec![value; ty.components() as usize];
        Self::from_scalars(ty, &values)
    }

    /// Zero value of a numeric or boolean type.
    pub fn zero(ty: Type) -> Option<Self> {
        Self::splat(ty, ScalarValue::Int(0))
    }

    /// Number of scalar components (0 for arrays and structures).
    pub fn component_count(&self) -> usize {
        match &self.data {
            ConstantData::Float(v) => v.len(),
            ConstantData::Double(v) => v.len(),
            ConstantData::Int(v) => v.len(),
            ConstantData::UInt(v) => v.len(),
            ConstantData::Bool(v) => v.len(),
            ConstantData::Array(_) | ConstantData::Struct(_) => 0,
        }
    }

    /// Component `i` of a scalar, vector or matrix constant.
    pub fn component(&self, i: usize) -> Option<ScalarValue> {
        match &self.data {
            ConstantData::Float(v) => v.get(i).map(|x| ScalarValue::Float(*x)),
            ConstantData::Double(v) => v.get(i).map(|x| ScalarValue::Double(*x)),
            ConstantData::Int(v) => v.get(i).map(|x| ScalarValue::Int(*x)),
            ConstantData::UInt(v) => v.get(i).map(|x| ScalarValue::UInt(*x)),
            ConstantData::Bool(v) => v.get(i).map(|x| ScalarValue::Bool(*x)),
            ConstantData::Array(_) | ConstantData::Struct(_) => None,
        }
    }

    /// All scalar components in storage order.
    pub fn components(&self) -> Vec<ScalarValue> {
        (0..self.component_count())
            .filter_map(|i| self.component(i))
            .collect()
    }

    /// Component `i` as an integer, used for constant indices.
    pub fn get_int_component(&self, i: usize) -> Option<i64> {
        self.component(i).map(ScalarValue::as_i64)
    }

    fn all_components(&self, pred: impl Fn(ScalarValue) -> bool) -> bool {
        let n = self.component_count();
        n > 0 && (0..n).all(|i| self.component(i).map_or(false, &pred))
    }

    /// Every component is zero (`false` for booleans).
    pub fn is_zero(&self) -> bool {
        self.all_components(|v| match v {
            ScalarValue::Bool(b) => !b,
            other => other.as_f64() == 0.0,
        })
    }

    /// Every component is one (`true` for booleans).
    pub fn is_one(&self) -> bool {
        self.all_components(|v| match v {
            ScalarValue::Bool(b) => b,
            other => other.as_f64() == 1.0,
        })
    }

    /// Every component is minus one.
    pub fn is_negative_one(&self) -> bool {
        self.all_components(|v| match v {
            ScalarValue::Bool(_) => false,
            other => other.as_f64() == -1.0,
        })
    }

    /// Element `i` of an array constant.
    pub fn array_element(&self, i: usize) -> Option<&Constant> {
        match &self.data {
            ConstantData::Array(elems) => elems.get(i),
            _ => None,
        }
    }

    /// Field `i` of a structure constant.
    pub fn struct_field(&self, i: usize) -> Option<&Constant> {
        match &self.data {
            ConstantData::Struct(fields) => fields.get(i),
            _ => None,
        }
    }
}
