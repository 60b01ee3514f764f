//! Local dead store elimination within straight-line code.

use glopt_ir::{visit, Statement, Unit, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
    passes::is_plain_storage,
};

/// Removes a whole-variable store that is overwritten later in the same
/// statement list before anything reads the variable.
///
/// The scan from a store stops at the first statement that is neither an
/// assignment nor a declaration, so calls and control flow keep earlier
/// stores alive.
#[derive(Debug)]
pub struct DeadCodeLocal;

impl Pass for DeadCodeLocal {
    fn id(&self) -> PassId {
        PassId::DeadCodeLocal
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let vars = &unit.vars;
        visit::rewrite_statement_lists(&mut unit.items, &mut |stmts| {
            let dead: alloc::vec::Vec<usize> = (0..stmts.len())
                .filter(|&i| is_overwritten(stmts, i, vars))
                .collect();
            for i in dead.iter().rev() {
                stmts.remove(*i);
            }
            !dead.is_empty()
        })
    }
}

fn is_overwritten(stmts: &[Statement], i: usize, vars: &VarTable) -> bool {
    let Some(v) = stmts[i]
        .as_assign()
        .and_then(|a| a.whole_var(vars))
        .filter(|v| is_plain_storage(vars.mode(*v)))
    else {
        return false;
    };
    for stmt in &stmts[i + 1..] {
        match stmt {
            Statement::Declare(_) => {}
            Statement::Assign(a) => {
                if visit::statement_rvalues(stmt)
                    .into_iter()
                    .any(|rv| visit::rvalue_reads(rv, v))
                {
                    return false;
                }
                if a.whole_var(vars) == Some(v) {
                    return true;
                }
            }
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{Rvalue, StorageMode, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_overwritten_store_removed() {
        let mut unit = Unit::new();
        let t = local(&mut unit, "t", Type::FLOAT);
        let out = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(t, float(1.0)),
                assign(t, float(2.0)),
                assign(out, Rvalue::var(t)),
            ],
        );
        assert!(run(&DeadCodeLocal, &mut unit));
        assert_eq!(
            main_body(&unit),
            &vec![assign(t, float(2.0)), assign(out, Rvalue::var(t))]
        );
        assert!(!run(&DeadCodeLocal, &mut unit));
    }

    #[test]
    fn test_self_read_keeps_store() {
        let mut unit = Unit::new();
        let t = local(&mut unit, "t", Type::FLOAT);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(t, float(1.0)),
                assign(t, add(Type::FLOAT, Rvalue::var(t), float(1.0))),
            ],
        );
        assert!(!run(&DeadCodeLocal, &mut unit));
    }
}
