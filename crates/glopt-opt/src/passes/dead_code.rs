//! Dead code elimination: drop variables that are never read, together
//! with their declarations and every store to them.

use alloc::collections::BTreeSet;

use glopt_ir::{visit, Deref, Statement, StorageMode, Unit, VarId};

use crate::{
    options::DeadCodeOptions,
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
    passes::{call_argument_roots, function_locals, is_plain_storage},
};

/// Whole-program variant. Unread globals, locals and (per
/// [`DeadCodeOptions`]) uniforms are removed.
#[derive(Debug)]
pub struct DeadCode;

/// Single-shader variant. Only variables declared in function bodies are
/// removed.
#[derive(Debug)]
pub struct DeadCodeUnlinked;

impl Pass for DeadCode {
    fn id(&self) -> PassId {
        PassId::DeadCode
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let options = match ctx.args {
            PassArgs::DeadCode(options) => options,
            _ => &ctx.options.dead_code,
        };
        let dead = unread(unit, None, options);
        remove(unit, &dead)
    }
}

impl Pass for DeadCodeUnlinked {
    fn id(&self) -> PassId {
        PassId::DeadCodeUnlinked
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let locals = function_locals(unit);
        let dead = unread(unit, Some(&locals), &ctx.options.dead_code);
        remove(unit, &dead)
    }
}

/// Removable variables that nothing reads.
fn unread(
    unit: &Unit,
    only: Option<&BTreeSet<VarId>>,
    options: &DeadCodeOptions,
) -> BTreeSet<VarId> {
    let usage = visit::var_usage(&unit.items);
    let by_reference = call_argument_roots(&unit.items);
    usage
        .iter()
        .filter(|(v, u)| u.reads == 0 && !by_reference.contains(*v))
        .map(|(v, _)| *v)
        .filter(|v| only.map_or(true, |set| set.contains(v)))
        .filter(|v| {
            let Some(var) = unit.vars.get(*v) else {
                return false;
            };
            if var.is_builtin() {
                return false;
            }
            match var.mode() {
                StorageMode::Uniform if only.is_none() => {
                    options.keep_only_assigned_uniforms
                        && var.constant_value.is_none()
                        && !var.decorations.explicit_location
                        && var.decorations.binding.is_none()
                }
                mode => is_plain_storage(mode),
            }
        })
        .collect()
}

fn remove(unit: &mut Unit, dead: &BTreeSet<VarId>) -> bool {
    if dead.is_empty() {
        return false;
    }
    log::trace!("dead variables: {:?}", dead);
    visit::rewrite_statement_lists(&mut unit.items, &mut |stmts| {
        let before = stmts.len();
        stmts.retain(|s| match s {
            Statement::Declare(v) => !dead.contains(v),
            Statement::Assign(a) => a.lhs.root_var().map_or(true, |v| !dead.contains(&v)),
            _ => true,
        });
        let mut changed = stmts.len() != before;
        for s in stmts.iter_mut() {
            if let Statement::Call(c) = s {
                if c.return_deref
                    .as_ref()
                    .and_then(Deref::root_var)
                    .map_or(false, |v| dead.contains(&v))
                {
                    c.return_deref = None;
                    changed = true;
                }
            }
        }
        changed
    })
}
