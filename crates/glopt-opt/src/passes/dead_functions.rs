//! Dead function elimination.

use alloc::{collections::BTreeSet, string::String};

use glopt_ir::{visit, Statement, Unit};

use crate::{
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

/// Removes functions that are never called, keeping the entry function.
/// Undefined prototypes of called functions are kept as well.
#[derive(Debug)]
pub struct DeadFunctions;

impl Pass for DeadFunctions {
    fn id(&self) -> PassId {
        PassId::DeadFunctions
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let entry = match ctx.args {
            PassArgs::DeadFunctions { entry } => entry.as_str(),
            _ => ctx.options.dead_functions.entry_function.as_str(),
        };
        let mut called: BTreeSet<String> = BTreeSet::new();
        visit::walk_statements(&unit.items, &mut |stmt| {
            if let Statement::Call(c) = stmt {
                if !c.builtin {
                    called.insert(c.callee.clone());
                }
            }
        });
        let before = unit.items.len();
        unit.items.retain(|s| match s {
            Statement::Function(f) => {
                let keep = f.name == entry || called.contains(&f.name);
                if !keep {
                    log::trace!("removing unused function {}", f.name);
                }
                keep
            }
            _ => true,
        });
        unit.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::Call;

    use super::*;
    use crate::passes::test_util::*;

    fn call(name: &str) -> Statement {
        Statement::Call(Call {
            callee: String::from(name),
            return_deref: None,
            args: vec![],
            builtin: false,
        })
    }

    #[test]
    fn test_uncalled_functions_removed() {
        let mut unit = Unit::new();
        push_function(&mut unit, "used", vec![]);
        push_function(&mut unit, "unused", vec![call("also_unused")]);
        push_function(&mut unit, "also_unused", vec![]);
        push_function(&mut unit, "main", vec![call("used")]);

        assert!(run(&DeadFunctions, &mut unit));
        let names: vec::Vec<&str> = unit.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["used", "also_unused", "main"]);
        // the callee of a removed function goes on the next run
        assert!(run(&DeadFunctions, &mut unit));
        assert_eq!(unit.functions().count(), 2);
        assert!(!run(&DeadFunctions, &mut unit));
    }

    #[test]
    fn test_custom_entry_kept() {
        let mut unit = Unit::new();
        push_function(&mut unit, "entry", vec![]);
        assert!(!run_with(
            &DeadFunctions,
            &mut unit,
            PassArgs::DeadFunctions {
                entry: String::from("entry")
            }
        ));
        assert!(run(&DeadFunctions, &mut unit));
        assert!(unit.is_empty());
    }
}
