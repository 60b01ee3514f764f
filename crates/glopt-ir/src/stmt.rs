//! Statement nodes.

use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::{
    rvalue::{component_letter, Deref, Rvalue},
    types::Type,
    unit::Function,
    variable::{VarId, VarTable},
};

/// Identity of a loop, unique within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoopId(u32);

impl LoopId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loop{}", self.0)
    }
}

/// Store of a value into storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub lhs: Deref,
    pub rhs: Rvalue,
    /// Bit `i` set when vector component `i` is written. Zero writes the
    /// whole value.
    ///
    /// With a partial mask, the right-hand side carries one component per
    /// written component, in component order.
    pub write_mask: u8,
    /// Execute only when this boolean is true
    pub condition: Option<Rvalue>,
}

impl Assignment {
    /// Whole-value assignment.
    pub fn new(lhs: Deref, rhs: Rvalue) -> Self {
        Self {
            lhs,
            rhs,
            write_mask: 0,
            condition: None,
        }
    }

    /// Assignment of the components selected by `write_mask`.
    pub fn masked(lhs: Deref, rhs: Rvalue, write_mask: u8) -> Self {
        Self {
            lhs,
            rhs,
            write_mask,
            condition: None,
        }
    }

    /// Write mask with the implicit whole-value mask made explicit for
    /// scalar and vector destinations. Zero for other types.
    pub fn effective_mask(&self, vars: &VarTable) -> u8 {
        let ty = self.lhs.ty(vars);
        let full = full_mask(&ty);
        if self.write_mask == 0 {
            full
        } else {
            self.write_mask & if full == 0 { 0xf } else { full }
        }
    }

    /// Writes only some components of a vector.
    pub fn is_partial(&self, vars: &VarTable) -> bool {
        let ty = self.lhs.ty(vars);
        ty.is_vector() && self.write_mask != 0 && self.write_mask != full_mask(&ty)
    }

    /// Unconditional store to a whole variable.
    pub fn whole_var(&self, vars: &VarTable) -> Option<VarId> {
        if self.condition.is_some() || self.is_partial(vars) {
            return None;
        }
        self.lhs.as_var()
    }
}

/// Mask with one bit per component of a scalar or vector type.
pub fn full_mask(ty: &Type) -> u8 {
    match ty {
        Type::Scalar(_) => 0x1,
        Type::Vector(_, n) => ((1u16 << *n) - 1) as u8,
        _ => 0,
    }
}

/// Components of a write mask in `xyzw` form.
pub fn mask_letters(mask: u8) -> String {
    (0..4u8)
        .filter(|i| mask & (1 << i) != 0)
        .map(component_letter)
        .collect()
}

/// Call of a user function or of a builtin without an IR operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    /// Storage receiving the return value
    pub return_deref: Option<Deref>,
    pub args: Vec<Rvalue>,
    /// Callee is provided by the target language
    pub builtin: bool,
}

/// Two-way branch.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Rvalue,
    pub then_body: Vec<Statement>,
    pub else_body: Vec<Statement>,
}

/// Unconditional loop, left only through `break`, `return` or `discard`.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub id: LoopId,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopJump {
    Break,
    Continue,
}

/// A statement in a statement list.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration
    Declare(VarId),
    Assign(Assignment),
    Call(Call),
    If(If),
    Loop(Loop),
    LoopJump(LoopJump),
    Return(Option<Rvalue>),
    /// Discard, optionally guarded by a condition
    Discard(Option<Rvalue>),
    EmitVertex(Rvalue),
    EndPrimitive(Rvalue),
    Barrier,
    /// Function definition (top level only)
    Function(Function),
}

impl Statement {
    pub fn assign(lhs: Deref, rhs: Rvalue) -> Self {
        Statement::Assign(Assignment::new(lhs, rhs))
    }

    /// Control never continues past this statement.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Statement::LoopJump(_) | Statement::Return(_) | Statement::Discard(None)
        )
    }

    pub fn as_assign(&self) -> Option<&Assignment> {
        match self {
            Statement::Assign(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<&If> {
        match self {
            Statement::If(i) => Some(i),
            _ => None,
        }
    }
}
