//! Compilation unit and functions.

use alloc::{string::String, vec::Vec};

use crate::{
    stmt::{Loop, LoopId, Statement},
    types::{StructType, Type},
    variable::{VarId, VarTable, Variable},
};

/// One overload of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub return_type: Type,
    /// Parameter variables in declaration order
    pub params: Vec<VarId>,
    pub body: Vec<Statement>,
    /// Provided by the target language
    pub is_builtin: bool,
    /// Has a body (a prototype alone leaves this unset)
    pub is_defined: bool,
}

impl Signature {
    pub fn new(return_type: Type, params: Vec<VarId>) -> Self {
        Self {
            return_type,
            params,
            body: Vec::new(),
            is_builtin: false,
            is_defined: false,
        }
    }

    /// Parameter types in order.
    pub fn param_types(&self, vars: &VarTable) -> Vec<Type> {
        self.params.iter().map(|p| vars.ty(*p)).collect()
    }
}

/// A named function with its overloads.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub signatures: Vec<Signature>,
}

impl Function {
    pub fn new(name: String) -> Self {
        Self {
            name,
            signatures: Vec::new(),
        }
    }

    /// Overload whose parameter types match `args` exactly.
    pub fn matching_signature(&self, args: &[Type], vars: &VarTable) -> Option<&Signature> {
        self.signatures
            .iter()
            .find(|s| s.param_types(vars).as_slice() == args)
    }

    pub fn has_definition(&self) -> bool {
        self.signatures.iter().any(|s| s.is_defined)
    }
}

/// A translation unit: variable arena plus the top-level statement list.
///
/// Top-level statements are declarations, function definitions and the
/// initializers of global variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub vars: VarTable,
    pub items: Vec<Statement>,
    /// User-declared structure types in declaration order
    pub structs: Vec<StructType>,
    next_loop: u32,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add_var(&mut self, var: Variable) -> VarId {
        self.vars.push(var)
    }

    /// Fresh loop identity.
    pub fn new_loop_id(&mut self) -> LoopId {
        let id = LoopId::new(self.next_loop);
        self.next_loop += 1;
        id
    }

    /// Loop node with a fresh identity.
    pub fn new_loop(&mut self, body: Vec<Statement>) -> Loop {
        Loop {
            id: self.new_loop_id(),
            body,
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> + '_ {
        self.items.iter().filter_map(|s| match s {
            Statement::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.items.iter_mut().find_map(|s| match s {
            Statement::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    /// Defined signature of the entry function.
    pub fn main_signature(&self, entry: &str) -> Option<&Signature> {
        self.function(entry)?
            .signatures
            .iter()
            .find(|s| s.is_defined && s.params.is_empty())
    }
}
