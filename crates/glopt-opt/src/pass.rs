//! Pass trait and the library of pass implementations.

use alloc::{boxed::Box, collections::BTreeMap};
use core::fmt::Debug;

use glopt_ir::{Target, Unit};

use crate::{
    options::OptimizationOptions,
    pass_id::{PassArgs, PassId},
    passes,
};

/// A rewrite pass over a unit.
pub trait Pass: Debug {
    /// Schedule slot this pass implements.
    fn id(&self) -> PassId;

    /// Human-readable name of the pass.
    fn name(&self) -> &str {
        self.id().name()
    }

    /// Run the pass on a unit. Returns `true` if anything was modified.
    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool;
}

/// Everything a pass may consult besides the unit itself.
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    pub target: &'a Target,
    pub args: &'a PassArgs,
    pub options: &'a OptimizationOptions,
    pub library: &'a PassLibrary,
}

impl<'a> PassContext<'a> {
    /// Run another pass of the library with its own arguments.
    ///
    /// Returns `false` when no implementation is registered.
    pub fn run_nested(&self, pass: PassId, args: &PassArgs, unit: &mut Unit) -> bool {
        match self.library.get(pass) {
            Some(imp) => {
                let ctx = PassContext { args, ..*self };
                let changed = imp.run(unit, &ctx);
                log::trace!("nested {} -> {}", pass, changed);
                changed
            }
            None => false,
        }
    }
}

/// Registered pass implementations, keyed by schedule slot.
#[derive(Debug, Default)]
pub struct PassLibrary {
    passes: BTreeMap<PassId, Box<dyn Pass>>,
}

impl PassLibrary {
    /// Empty library; every scheduled pass is skipped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding every built-in pass.
    pub fn with_builtins() -> Self {
        let mut lib = Self::new();
        for pass in passes::builtins() {
            lib.register(pass);
        }
        lib
    }

    /// Register an implementation, replacing any previous one for its slot.
    pub fn register(&mut self, pass: Box<dyn Pass>) {
        self.passes.insert(pass.id(), pass);
    }

    pub fn get(&self, id: PassId) -> Option<&dyn Pass> {
        self.passes.get(&id).map(|p| &**p)
    }

    pub fn contains(&self, id: PassId) -> bool {
        self.passes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}
