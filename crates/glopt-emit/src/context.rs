//! Per-emission tracking state.

use alloc::{collections::BTreeMap, format, string::String, vec::Vec};

use glopt_ir::{Statement, StorageMode, VarId, VarTable};

use crate::names::{NameAllocator, NameStyle};

/// State of one emission run.
///
/// Holds the temporary counter, the printable ids assigned to temporaries,
/// the global-scope statements waiting to be replayed in the entry function,
/// and the guard recording that the entry function consumed them.
#[derive(Debug)]
pub struct PrintContext {
    names: NameAllocator,
    temp_counter: u32,
    temp_ids: BTreeMap<VarId, u32>,
    pending: Vec<Statement>,
    main_done: bool,
}

impl Default for PrintContext {
    fn default() -> Self {
        Self::new(NameStyle::default())
    }
}

impl PrintContext {
    pub fn new(style: NameStyle) -> Self {
        Self {
            names: NameAllocator::new(style),
            temp_counter: 0,
            temp_ids: BTreeMap::new(),
            pending: Vec::new(),
            main_done: false,
        }
    }

    /// Printable name of a variable.
    ///
    /// Temporaries are numbered on first reference and print as
    /// `tmpvar_N`; other variables go through the name allocator.
    pub fn name(&mut self, id: VarId, vars: &VarTable) -> String {
        if let Some(name) = self.names.get(id) {
            return String::from(name);
        }
        let Some(var) = vars.get(id) else {
            log::warn!("reference to unknown variable {}", id);
            return String::from("error");
        };
        if var.mode() == StorageMode::Temporary {
            self.temp_counter += 1;
            self.temp_ids.insert(id, self.temp_counter);
            let name = format!("tmpvar_{}", self.temp_counter);
            return self.names.claim(id, &name);
        }
        self.names.resolve(id, var)
    }

    /// Sequential id given to a temporary, if it was referenced.
    pub fn temp_id(&self, id: VarId) -> Option<u32> {
        self.temp_ids.get(&id).copied()
    }

    pub fn push_scope(&mut self) {
        self.names.push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.names.pop_scope();
    }

    /// Queue a global-scope statement for the entry function.
    ///
    /// Returns `false` when the entry function was already printed and the
    /// statement can no longer be placed.
    pub fn defer(&mut self, stmt: Statement) -> bool {
        if self.main_done {
            return false;
        }
        self.pending.push(stmt);
        true
    }

    /// Hand the pending statements to the entry function. Only the first
    /// call yields them.
    pub fn take_pending(&mut self) -> Vec<Statement> {
        if self.main_done {
            return Vec::new();
        }
        self.main_done = true;
        core::mem::take(&mut self.pending)
    }

    pub fn main_done(&self) -> bool {
        self.main_done
    }

    pub fn pending(&self) -> &[Statement] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use glopt_ir::{Type, Variable};

    use super::*;

    #[test]
    fn test_temporaries_are_numbered() {
        let mut vars = VarTable::new();
        let a = vars.push(Variable::new(
            Some("t".to_string()),
            Type::FLOAT,
            StorageMode::Temporary,
        ));
        let b = vars.push(Variable::new(
            Some("t".to_string()),
            Type::FLOAT,
            StorageMode::Temporary,
        ));
        let mut ctx = PrintContext::default();
        assert_eq!(ctx.name(b, &vars), "tmpvar_1");
        assert_eq!(ctx.name(a, &vars), "tmpvar_2");
        assert_eq!(ctx.name(b, &vars), "tmpvar_1");
        assert_eq!(ctx.temp_id(a), Some(2));
    }

    #[test]
    fn test_pending_taken_once() {
        let mut ctx = PrintContext::default();
        assert!(ctx.defer(Statement::Barrier));
        assert_eq!(ctx.pending().len(), 1);
        assert_eq!(ctx.take_pending(), alloc::vec![Statement::Barrier]);
        assert!(ctx.main_done());
        assert!(ctx.take_pending().is_empty());
        assert!(!ctx.defer(Statement::Barrier));
    }

    #[test]
    fn test_unknown_variable() {
        let vars = VarTable::new();
        let mut ctx = PrintContext::default();
        assert_eq!(ctx.name(VarId::new(3), &vars), "error");
    }
}
