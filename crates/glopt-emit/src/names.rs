//! Printable names for IR variables.
//!
//! Variables keep their source name unless another variable already claimed
//! it in a visible scope. Scopes are pushed per function signature, so two
//! functions may reuse the same local names.

use alloc::{
    collections::{BTreeMap, BTreeSet},
    format,
    string::String,
    vec::Vec,
};

use glopt_ir::{VarId, Variable};

/// A lexical scope: the printable names claimed in it.
#[derive(Debug, Default)]
pub struct Scope {
    names: BTreeSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: String) {
        self.names.insert(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }
}

/// Stack of scopes. The bottom scope holds global names and is never
/// popped.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// Stack holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: alloc::vec![Scope::new()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope. The global scope stays.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Claim `name` in the innermost scope.
    pub fn declare(&mut self, name: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declare(name);
        }
    }

    /// Check if `name` is claimed in any visible scope.
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|s| s.contains(name))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// How synthesized names are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameStyle {
    /// `name@N` and `parameter@N`, unambiguous in tree dumps
    #[default]
    Tree,
    /// `name_N` and `parameter_N`, valid identifiers in recompiled source
    Source,
}

impl NameStyle {
    fn separator(self) -> char {
        match self {
            NameStyle::Tree => '@',
            NameStyle::Source => '_',
        }
    }
}

/// Assigns collision-free printable names to variables.
///
/// A name, once assigned, is returned for every later reference to the same
/// variable.
#[derive(Debug, Default)]
pub struct NameAllocator {
    style: NameStyle,
    scopes: ScopeStack,
    printable: BTreeMap<VarId, String>,
    anonymous: u32,
    renamed: u32,
}

impl NameAllocator {
    pub fn new(style: NameStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn style(&self) -> NameStyle {
        self.style
    }

    pub fn push_scope(&mut self) {
        self.scopes.push();
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Printable name of `var`, assigning one on first use.
    pub fn resolve(&mut self, id: VarId, var: &Variable) -> String {
        if let Some(name) = self.printable.get(&id) {
            return name.clone();
        }
        let name = match var.name() {
            // Builtins are declared by the language and cannot collide.
            Some(name) if var.is_builtin() => String::from(name),
            Some(name) if !self.scopes.is_declared(name) => String::from(name),
            Some(name) => self.fresh(name, Counter::Renamed),
            None => self.fresh("parameter", Counter::Anonymous),
        };
        if !var.is_builtin() {
            self.scopes.declare(name.clone());
        }
        self.printable.insert(id, name.clone());
        name
    }

    /// Claim a name that was synthesized outside the allocator, such as a
    /// temporary's numbered name.
    pub fn claim(&mut self, id: VarId, name: &str) -> String {
        let name = if self.scopes.is_declared(name) {
            self.fresh(name, Counter::Renamed)
        } else {
            String::from(name)
        };
        self.scopes.declare(name.clone());
        self.printable.insert(id, name.clone());
        name
    }

    /// Name already assigned to `id`.
    pub fn get(&self, id: VarId) -> Option<&str> {
        self.printable.get(&id).map(String::as_str)
    }

    fn fresh(&mut self, base: &str, counter: Counter) -> String {
        let sep = self.style.separator();
        loop {
            let n = match counter {
                Counter::Anonymous => {
                    self.anonymous += 1;
                    self.anonymous
                }
                Counter::Renamed => {
                    self.renamed += 1;
                    self.renamed
                }
            };
            let name = format!("{}{}{}", base, sep, n);
            if !self.scopes.is_declared(&name) {
                return name;
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Counter {
    Anonymous,
    Renamed,
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use glopt_ir::{StorageMode, Type};

    use super::*;

    fn named(name: &str) -> Variable {
        Variable::new(Some(name.to_string()), Type::FLOAT, StorageMode::Auto)
    }

    #[test]
    fn test_original_name_kept() {
        let mut names = NameAllocator::new(NameStyle::Tree);
        assert_eq!(names.resolve(VarId::new(0), &named("color")), "color");
        assert_eq!(names.resolve(VarId::new(0), &named("color")), "color");
    }

    #[test]
    fn test_collision_renamed() {
        let mut names = NameAllocator::new(NameStyle::Tree);
        let a = names.resolve(VarId::new(0), &named("x"));
        let b = names.resolve(VarId::new(1), &named("x"));
        assert_eq!(a, "x");
        assert_eq!(b, "x@1");
        assert_eq!(names.get(VarId::new(1)), Some("x@1"));
    }

    #[test]
    fn test_anonymous_parameters() {
        let mut names = NameAllocator::new(NameStyle::Tree);
        let anon = Variable::new(None, Type::INT, StorageMode::FunctionIn);
        assert_eq!(names.resolve(VarId::new(0), &anon), "parameter@1");
        assert_eq!(names.resolve(VarId::new(1), &anon), "parameter@2");
    }

    #[test]
    fn test_scopes_release_names() {
        let mut names = NameAllocator::new(NameStyle::Source);
        names.push_scope();
        assert_eq!(names.resolve(VarId::new(0), &named("t")), "t");
        names.pop_scope();
        names.push_scope();
        assert_eq!(names.resolve(VarId::new(1), &named("t")), "t");
        names.pop_scope();
    }

    #[test]
    fn test_global_shadowed_by_local() {
        let mut names = NameAllocator::new(NameStyle::Source);
        assert_eq!(names.resolve(VarId::new(0), &named("k")), "k");
        names.push_scope();
        assert_eq!(names.resolve(VarId::new(1), &named("k")), "k_1");
    }

    #[test]
    fn test_synthesized_name_skips_taken() {
        let mut names = NameAllocator::new(NameStyle::Source);
        names.resolve(VarId::new(0), &named("x_1"));
        names.resolve(VarId::new(1), &named("x"));
        assert_eq!(names.resolve(VarId::new(2), &named("x")), "x_2");
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut stack = ScopeStack::new();
        assert!(stack.pop().is_none());
        stack.declare("g".to_string());
        stack.push();
        assert!(stack.is_declared("g"));
        assert_eq!(stack.depth(), 2);
    }
}
