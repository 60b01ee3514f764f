//! Traversal helpers over statements and values.
//!
//! Node kinds form closed enums, so traversal is plain `match`-based
//! recursion. Passes build on these helpers instead of hand-rolling the
//! recursion for every node kind.

use alloc::{collections::BTreeMap, vec, vec::Vec};

use crate::{
    rvalue::{Deref, Rvalue},
    stmt::Statement,
    variable::VarId,
};

/// Direct child values of a value.
pub fn rvalue_children(rv: &Rvalue) -> Vec<&Rvalue> {
    match rv {
        Rvalue::Expression(e) => e.operands.iter().collect(),
        Rvalue::Texture(t) => {
            let mut out = deref_children(&t.sampler);
            out.extend(
                [&t.coordinate, &t.projector, &t.shadow_comparator, &t.offset]
                    .into_iter()
                    .flatten(),
            );
            out.extend(t.op.operands());
            out
        }
        Rvalue::Swizzle(s) => vec![&s.val],
        Rvalue::Deref(d) => deref_children(d),
        Rvalue::Constant(_) => Vec::new(),
    }
}

/// Direct child values of a value, mutably.
pub fn rvalue_children_mut(rv: &mut Rvalue) -> Vec<&mut Rvalue> {
    match rv {
        Rvalue::Expression(e) => e.operands.iter_mut().collect(),
        Rvalue::Texture(t) => {
            let t = &mut **t;
            let mut out = deref_children_mut(&mut t.sampler);
            out.extend(
                [
                    &mut t.coordinate,
                    &mut t.projector,
                    &mut t.shadow_comparator,
                    &mut t.offset,
                ]
                .into_iter()
                .flatten(),
            );
            out.extend(t.op.operands_mut());
            out
        }
        Rvalue::Swizzle(s) => vec![&mut s.val],
        Rvalue::Deref(d) => deref_children_mut(d),
        Rvalue::Constant(_) => Vec::new(),
    }
}

/// Child values of an access path.
pub fn deref_children(d: &Deref) -> Vec<&Rvalue> {
    match d {
        Deref::Var(_) => Vec::new(),
        Deref::Array { array, index } => vec![&**array, &**index],
        Deref::Record { record, .. } => vec![&**record],
    }
}

pub fn deref_children_mut(d: &mut Deref) -> Vec<&mut Rvalue> {
    match d {
        Deref::Var(_) => Vec::new(),
        Deref::Array { array, index } => vec![&mut **array, &mut **index],
        Deref::Record { record, .. } => vec![&mut **record],
    }
}

/// Pre-order walk of a value tree.
pub fn walk_rvalue<'a>(rv: &'a Rvalue, f: &mut dyn FnMut(&'a Rvalue)) {
    f(rv);
    for child in rvalue_children(rv) {
        walk_rvalue(child, f);
    }
}

/// Post-order rewrite of a value tree. `f` sees children before parents
/// and returns whether it changed the node.
pub fn rewrite_rvalue(rv: &mut Rvalue, f: &mut dyn FnMut(&mut Rvalue) -> bool) -> bool {
    let mut changed = false;
    for child in rvalue_children_mut(rv) {
        changed |= rewrite_rvalue(child, f);
    }
    changed | f(rv)
}

/// Values evaluated directly by a statement, not counting nested statement
/// lists. Left-hand-side paths contribute their index and record operands.
pub fn statement_rvalues(stmt: &Statement) -> Vec<&Rvalue> {
    match stmt {
        Statement::Assign(a) => {
            let mut out = deref_children(&a.lhs);
            out.push(&a.rhs);
            out.extend(a.condition.iter());
            out
        }
        Statement::Call(c) => {
            let mut out: Vec<&Rvalue> = c.args.iter().collect();
            if let Some(d) = &c.return_deref {
                out.extend(deref_children(d));
            }
            out
        }
        Statement::If(i) => vec![&i.condition],
        Statement::Return(v) | Statement::Discard(v) => v.iter().collect(),
        Statement::EmitVertex(v) | Statement::EndPrimitive(v) => vec![v],
        Statement::Declare(_)
        | Statement::Loop(_)
        | Statement::LoopJump(_)
        | Statement::Barrier
        | Statement::Function(_) => Vec::new(),
    }
}

pub fn statement_rvalues_mut(stmt: &mut Statement) -> Vec<&mut Rvalue> {
    match stmt {
        Statement::Assign(a) => {
            let mut out = deref_children_mut(&mut a.lhs);
            out.push(&mut a.rhs);
            out.extend(a.condition.iter_mut());
            out
        }
        Statement::Call(c) => {
            let mut out: Vec<&mut Rvalue> = c.args.iter_mut().collect();
            if let Some(d) = &mut c.return_deref {
                out.extend(deref_children_mut(d));
            }
            out
        }
        Statement::If(i) => vec![&mut i.condition],
        Statement::Return(v) | Statement::Discard(v) => v.iter_mut().collect(),
        Statement::EmitVertex(v) | Statement::EndPrimitive(v) => vec![v],
        Statement::Declare(_)
        | Statement::Loop(_)
        | Statement::LoopJump(_)
        | Statement::Barrier
        | Statement::Function(_) => Vec::new(),
    }
}

/// Statement lists nested directly inside a statement.
pub fn nested_bodies(stmt: &Statement) -> Vec<&Vec<Statement>> {
    match stmt {
        Statement::If(i) => vec![&i.then_body, &i.else_body],
        Statement::Loop(l) => vec![&l.body],
        Statement::Function(f) => f.signatures.iter().map(|s| &s.body).collect(),
        _ => Vec::new(),
    }
}

pub fn nested_bodies_mut(stmt: &mut Statement) -> Vec<&mut Vec<Statement>> {
    match stmt {
        Statement::If(i) => vec![&mut i.then_body, &mut i.else_body],
        Statement::Loop(l) => vec![&mut l.body],
        Statement::Function(f) => f.signatures.iter_mut().map(|s| &mut s.body).collect(),
        _ => Vec::new(),
    }
}

/// Pre-order walk of every statement, descending into nested lists.
pub fn walk_statements<'a>(stmts: &'a [Statement], f: &mut dyn FnMut(&'a Statement)) {
    for stmt in stmts {
        f(stmt);
        for body in nested_bodies(stmt) {
            walk_statements(body, f);
        }
    }
}

/// Apply `f` to every statement list, innermost lists first.
pub fn rewrite_statement_lists(
    stmts: &mut Vec<Statement>,
    f: &mut dyn FnMut(&mut Vec<Statement>) -> bool,
) -> bool {
    let mut changed = false;
    for stmt in stmts.iter_mut() {
        for body in nested_bodies_mut(stmt) {
            changed |= rewrite_statement_lists(body, f);
        }
    }
    changed | f(stmts)
}

/// Post-order rewrite of every value in every statement.
pub fn rewrite_all_rvalues(
    stmts: &mut [Statement],
    f: &mut dyn FnMut(&mut Rvalue) -> bool,
) -> bool {
    let mut changed = false;
    for stmt in stmts.iter_mut() {
        for rv in statement_rvalues_mut(stmt) {
            changed |= rewrite_rvalue(rv, f);
        }
        for body in nested_bodies_mut(stmt) {
            changed |= rewrite_all_rvalues(body, f);
        }
    }
    changed
}

/// How often each variable is read, written and declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarUsage {
    pub reads: u32,
    pub writes: u32,
    pub declarations: u32,
}

impl VarUsage {
    pub fn is_referenced(&self) -> bool {
        self.reads > 0 || self.writes > 0
    }
}

/// Count variable reads, writes and declarations in `stmts`.
///
/// Assignment destinations and call return storage count as writes of
/// their root variable. Arguments of non-builtin calls may be `out` or
/// `inout` parameters, so their root variable counts as both a read and a
/// write. Everything else referencing a variable counts as a read.
pub fn var_usage(stmts: &[Statement]) -> BTreeMap<VarId, VarUsage> {
    let mut usage: BTreeMap<VarId, VarUsage> = BTreeMap::new();
    collect_usage(stmts, &mut usage);
    usage
}

/// Add the usage counts of `stmts` to `usage`.
pub fn collect_usage(stmts: &[Statement], usage: &mut BTreeMap<VarId, VarUsage>) {
    walk_statements(stmts, &mut |stmt| {
        match stmt {
            Statement::Declare(v) => usage.entry(*v).or_default().declarations += 1,
            Statement::Assign(a) => {
                if let Some(v) = a.lhs.root_var() {
                    usage.entry(v).or_default().writes += 1;
                }
            }
            Statement::Call(c) => {
                if let Some(v) = c.return_deref.as_ref().and_then(Deref::root_var) {
                    usage.entry(v).or_default().writes += 1;
                }
                if !c.builtin {
                    for v in c.args.iter().filter_map(Rvalue::root_var) {
                        usage.entry(v).or_default().writes += 1;
                    }
                }
            }
            Statement::Function(f) => {
                for sig in &f.signatures {
                    for p in &sig.params {
                        usage.entry(*p).or_default().declarations += 1;
                    }
                }
            }
            _ => {}
        }
        for rv in statement_rvalues(stmt) {
            walk_rvalue(rv, &mut |node| {
                if let Rvalue::Deref(Deref::Var(v)) = node {
                    usage.entry(*v).or_default().reads += 1;
                }
            });
        }
    });
}

/// Check whether `var` is referenced anywhere in `stmts`.
pub fn references_var(stmts: &[Statement], var: VarId) -> bool {
    var_usage(stmts)
        .get(&var)
        .map_or(false, VarUsage::is_referenced)
}

/// Check whether a value reads `var`.
pub fn rvalue_reads(rv: &Rvalue, var: VarId) -> bool {
    let mut found = false;
    walk_rvalue(rv, &mut |node| {
        if node.as_var() == Some(var) {
            found = true;
        }
    });
    found
}

/// Check whether a statement list contains a loop jump that applies to the
/// enclosing loop (jumps nested in inner loops are not counted).
pub fn contains_loop_jump(stmts: &[Statement]) -> bool {
    stmts.iter().any(|s| match s {
        Statement::LoopJump(_) => true,
        Statement::If(i) => contains_loop_jump(&i.then_body) || contains_loop_jump(&i.else_body),
        _ => false,
    })
}
