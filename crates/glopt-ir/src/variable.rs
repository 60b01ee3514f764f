//! Variables and their decorations.

use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::{constant::Constant, types::Type};

/// Variable identity: an index into the unit's [`VarTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

impl VarId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// Storage qualifier of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMode {
    /// Global or function local without qualifier
    Auto,
    Uniform,
    ShaderStorage,
    ShaderShared,
    /// Stage input
    ShaderIn,
    /// Stage output
    ShaderOut,
    /// `in` function parameter
    FunctionIn,
    /// `out` function parameter
    FunctionOut,
    /// `inout` function parameter
    FunctionInOut,
    /// `const in` function parameter
    ConstIn,
    /// System value
    SystemValue,
    /// Compiler-generated temporary
    Temporary,
}

impl StorageMode {
    /// Check if this is a function parameter mode.
    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            StorageMode::FunctionIn
                | StorageMode::FunctionOut
                | StorageMode::FunctionInOut
                | StorageMode::ConstIn
        )
    }

    /// Check if the variable lives in the interface of the shader stage.
    pub fn is_interface(self) -> bool {
        matches!(
            self,
            StorageMode::Uniform
                | StorageMode::ShaderStorage
                | StorageMode::ShaderShared
                | StorageMode::ShaderIn
                | StorageMode::ShaderOut
                | StorageMode::SystemValue
        )
    }
}

/// Interpolation qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    #[default]
    None,
    Smooth,
    Flat,
    NoPerspective,
}

/// Precision qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    #[default]
    None,
    High,
    Medium,
    Low,
}

/// Memory access qualifiers for images and buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryAccess {
    pub read_only: bool,
    pub write_only: bool,
    pub coherent: bool,
    pub volatile: bool,
    pub restrict: bool,
}

/// Image format layout qualifiers and their GL enum values.
const IMAGE_FORMATS: &[(&str, u32)] = &[
    ("rgba32f", 0x8814),
    ("rgba16f", 0x881A),
    ("rg32f", 0x8230),
    ("rg16f", 0x822F),
    ("r11f_g11f_b10f", 0x8C3A),
    ("r32f", 0x822E),
    ("r16f", 0x822D),
    ("rgba16", 0x805B),
    ("rgb10_a2", 0x8059),
    ("rgba8", 0x8058),
    ("rg16", 0x822C),
    ("rg8", 0x822B),
    ("r16", 0x822A),
    ("r8", 0x8229),
    ("rgba16_snorm", 0x8F9B),
    ("rgba8_snorm", 0x8F97),
    ("rg16_snorm", 0x8F99),
    ("rg8_snorm", 0x8F95),
    ("r16_snorm", 0x8F98),
    ("r8_snorm", 0x8F94),
    ("rgba32i", 0x8D82),
    ("rgba16i", 0x8D88),
    ("rgba8i", 0x8D8E),
    ("rg32i", 0x823B),
    ("rg16i", 0x8239),
    ("rg8i", 0x8237),
    ("r32i", 0x8235),
    ("r16i", 0x8233),
    ("r8i", 0x8231),
    ("rgba32ui", 0x8D70),
    ("rgba16ui", 0x8D76),
    ("rgb10_a2ui", 0x906F),
    ("rgba8ui", 0x8D7C),
    ("rg32ui", 0x823C),
    ("rg16ui", 0x823A),
    ("rg8ui", 0x8238),
    ("r32ui", 0x8236),
    ("r16ui", 0x8234),
    ("r8ui", 0x8232),
];

/// Layout qualifier spelling of an image format enum.
pub fn image_format_name(format: u32) -> Option<&'static str> {
    IMAGE_FORMATS
        .iter()
        .find(|(_, f)| *f == format)
        .map(|(name, _)| *name)
}

/// Image format enum of a layout qualifier, if it names one.
pub fn image_format_from_name(name: &str) -> Option<u32> {
    IMAGE_FORMATS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

/// Independent decoration flags of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decorations {
    pub binding: Option<u32>,
    pub location: Option<i32>,
    /// Location was given by a layout qualifier rather than assigned
    pub explicit_location: bool,
    pub component: Option<u32>,
    pub centroid: bool,
    pub sample: bool,
    pub patch: bool,
    pub bindless: bool,
    pub bound: bool,
    pub image_format: Option<u32>,
    pub memory: MemoryAccess,
    pub invariant: bool,
    pub explicit_invariant: bool,
    pub precise: bool,
    pub precision: Precision,
    pub stream: Option<u32>,
    pub interpolation: Interpolation,
}

/// A variable declaration.
///
/// Storage mode and type are fixed at creation. Decorations and the constant
/// value may be updated by passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: Option<String>,
    ty: Type,
    mode: StorageMode,
    /// Decorations (qualifiers other than storage)
    pub decorations: Decorations,
    /// Compile-time constant value, if known
    pub constant_value: Option<Constant>,
    /// Declared `const`
    pub read_only: bool,
}

impl Variable {
    pub fn new(name: Option<String>, ty: Type, mode: StorageMode) -> Self {
        Self {
            name,
            ty,
            mode,
            decorations: Decorations::default(),
            constant_value: None,
            read_only: false,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Builtin variables are implicitly declared by the target language.
    pub fn is_builtin(&self) -> bool {
        self.name.as_deref().map_or(false, |n| n.starts_with("gl_"))
    }
}

/// Arena of all variables of a unit.
///
/// Variables are never removed; statements reference them by [`VarId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarTable {
    vars: Vec<Variable>,
}

impl VarTable {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Add a variable and return its identity.
    pub fn push(&mut self, var: Variable) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    pub fn get(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.index())
    }

    pub fn get_mut(&mut self, id: VarId) -> Option<&mut Variable> {
        self.vars.get_mut(id.index())
    }

    pub fn contains(&self, id: VarId) -> bool {
        id.index() < self.vars.len()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Type of a variable, `Void` for an unknown identity.
    pub fn ty(&self, id: VarId) -> Type {
        self.get(id).map(|v| v.ty().clone()).unwrap_or(Type::Void)
    }

    /// Storage mode of a variable, `Auto` for an unknown identity.
    pub fn mode(&self, id: VarId) -> StorageMode {
        self.get(id).map(|v| v.mode()).unwrap_or(StorageMode::Auto)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &Variable)> + '_ {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId::new(i as u32), v))
    }

    /// Find the most recently created variable with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<VarId> {
        self.iter()
            .filter(|(_, v)| v.name() == Some(name))
            .map(|(id, _)| id)
            .last()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_var_table_push_and_lookup() {
        let mut vars = VarTable::new();
        let a = vars.push(Variable::new(
            Some("a".to_string()),
            Type::FLOAT,
            StorageMode::Uniform,
        ));
        let b = vars.push(Variable::new(None, Type::INT, StorageMode::FunctionIn));
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.ty(a), Type::FLOAT);
        assert_eq!(vars.mode(b), StorageMode::FunctionIn);
        assert_eq!(vars.get(b).and_then(|v| v.name()), None);
        assert!(!vars.contains(VarId::new(7)));
        assert_eq!(vars.ty(VarId::new(7)), Type::Void);
    }

    #[test]
    fn test_image_format_names() {
        assert_eq!(image_format_name(0x8814), Some("rgba32f"));
        assert_eq!(image_format_from_name("r32ui"), Some(0x8236));
        assert_eq!(image_format_from_name("location"), None);
        assert_eq!(image_format_name(0), None);
    }

    #[test]
    fn test_builtin_detection() {
        let v = Variable::new(
            Some("gl_Position".to_string()),
            Type::Vector(crate::BaseType::Float, 4),
            StorageMode::ShaderOut,
        );
        assert!(v.is_builtin());
        let w = Variable::new(Some("glow".to_string()), Type::FLOAT, StorageMode::Auto);
        assert!(!w.is_builtin());
    }

    #[test]
    fn test_mode_classes() {
        assert!(StorageMode::FunctionInOut.is_parameter());
        assert!(!StorageMode::ShaderIn.is_parameter());
        assert!(StorageMode::Uniform.is_interface());
        assert!(!StorageMode::Temporary.is_interface());
    }
}
