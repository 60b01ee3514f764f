//! Symbol table for lowering.
//!
//! Tracks variables per lexical scope, user structure types and the
//! overload set of every user function.

use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{StorageMode, StructType, Type, VarId};

/// Parameter qualifier for function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterQualifier {
    /// Input parameter (default, pass by value)
    In,
    /// `const in`
    ConstIn,
    /// Output parameter, written back to the argument
    Out,
    /// Input/output parameter
    InOut,
}

impl ParameterQualifier {
    /// Check if the argument must be an assignable place.
    pub fn is_by_reference(self) -> bool {
        matches!(self, ParameterQualifier::Out | ParameterQualifier::InOut)
    }

    pub fn storage_mode(self) -> StorageMode {
        match self {
            ParameterQualifier::In => StorageMode::FunctionIn,
            ParameterQualifier::ConstIn => StorageMode::ConstIn,
            ParameterQualifier::Out => StorageMode::FunctionOut,
            ParameterQualifier::InOut => StorageMode::FunctionInOut,
        }
    }
}

/// Function parameter information.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub qualifier: ParameterQualifier,
    pub ty: Type,
}

/// One overload of a user function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub params: Vec<Parameter>,
    pub return_type: Type,
    /// A body has been seen
    pub defined: bool,
}

impl FunctionSignature {
    pub fn param_types(&self) -> impl Iterator<Item = &Type> + '_ {
        self.params.iter().map(|p| &p.ty)
    }
}

/// Symbol table for tracking functions, structures and variables.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Overloads indexed by function name
    functions: BTreeMap<String, Vec<FunctionSignature>>,
    structs: BTreeMap<String, StructType>,
    /// Stack of scopes for variable lookup; index 0 is the global scope
    scopes: Vec<BTreeMap<String, VarId>>,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
            structs: BTreeMap::new(),
            scopes: alloc::vec![BTreeMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn is_global_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Declare a variable in the current scope.
    ///
    /// Returns `Err` if the name is already declared in the current scope.
    pub fn declare_variable(&mut self, name: &str, id: VarId) -> Result<(), String> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| "No active scope".to_string())?;
        if scope.contains_key(name) {
            return Err(format!("'{}' redeclared in the same scope", name));
        }
        scope.insert(name.to_string(), id);
        Ok(())
    }

    /// Declare a variable in the global scope regardless of nesting.
    pub fn declare_global(&mut self, name: &str, id: VarId) {
        if let Some(globals) = self.scopes.first_mut() {
            globals.insert(name.to_string(), id);
        }
    }

    /// Look up a variable, searching from the current scope outward.
    pub fn lookup_variable(&self, name: &str) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Register a structure type.
    ///
    /// Returns `Err` if the name is already taken.
    pub fn declare_struct(&mut self, st: StructType) -> Result<(), String> {
        if self.structs.contains_key(&st.name) {
            return Err(format!("structure '{}' redefined", st.name));
        }
        self.structs.insert(st.name.clone(), st);
        Ok(())
    }

    pub fn lookup_struct(&self, name: &str) -> Option<&StructType> {
        self.structs.get(name)
    }

    /// Register a prototype or definition.
    ///
    /// A signature matching an earlier prototype by parameter types merges
    /// with it. Returns the overload index, or `Err` on a conflicting return
    /// type or a second definition.
    pub fn declare_function(
        &mut self,
        name: &str,
        sig: FunctionSignature,
    ) -> Result<usize, String> {
        let overloads = self.functions.entry(name.to_string()).or_default();
        let existing = overloads
            .iter()
            .position(|o| o.param_types().eq(sig.param_types()));
        match existing {
            Some(i) => {
                let o = &mut overloads[i];
                if o.return_type != sig.return_type {
                    return Err(format!(
                        "function '{}' redeclared with a different return type",
                        name
                    ));
                }
                if o.defined && sig.defined {
                    return Err(format!("function '{}' already has a body", name));
                }
                o.defined |= sig.defined;
                o.params = sig.params;
                Ok(i)
            }
            None => {
                overloads.push(sig);
                Ok(overloads.len() - 1)
            }
        }
    }

    /// All overloads of a user function.
    pub fn lookup_function(&self, name: &str) -> &[FunctionSignature] {
        self.functions.get(name).map_or(&[], Vec::as_slice)
    }

    /// Get the number of active scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
