//! Loop unrolling.
//!
//! Only counting loops in the shape recognized by [`LoopAnalysis`] are
//! unrolled: a single leading terminator, a single induction variable with
//! a constant start value, and a body free of other loop jumps and nested
//! loops. The trip count is found by evaluating the terminator for each
//! value the induction variable takes.

use alloc::{collections::BTreeMap, vec::Vec};

use glopt_ir::{
    visit, Constant, ExprOp, LoopAnalysis, LoopId, LoopState, Rvalue, Statement, Unit, VarTable,
};

use crate::{
    eval,
    options::LowerJumpsOptions,
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

#[derive(Debug)]
pub struct UnrollLoops;

impl Pass for UnrollLoops {
    fn id(&self) -> PassId {
        PassId::UnrollLoops
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let max = match ctx.args {
            PassArgs::UnrollLoops { max_iterations } => *max_iterations,
            _ => ctx.options.limits.max_unroll_iterations,
        };
        if max == 0 {
            return false;
        }

        let plans = plan(unit, max);
        if plans.is_empty() {
            return false;
        }

        let mut changed = false;
        for item in unit.items.iter_mut() {
            if let Statement::Function(f) = item {
                for sig in f.signatures.iter_mut() {
                    changed |= visit::rewrite_statement_lists(&mut sig.body, &mut |list| {
                        expand(list, &plans)
                    });
                }
            }
        }
        if changed {
            cleanup(unit, ctx);
        }
        changed
    }
}

/// Trip counts of the loops that will be unrolled.
fn plan(unit: &Unit, max: u32) -> BTreeMap<LoopId, u32> {
    let analysis = LoopAnalysis::analyze(unit);
    let mut plans = BTreeMap::new();
    visit::walk_statements(&unit.items, &mut |stmt| {
        let Statement::Loop(l) = stmt else {
            return;
        };
        let Some(state) = analysis.get(l.id) else {
            return;
        };
        if !is_unrollable(&l.body, state) {
            return;
        }
        match trip_count(state, &unit.vars, max) {
            Some(n) => {
                log::trace!("unrolling {} ({} iterations)", l.id, n);
                plans.insert(l.id, n);
            }
            None => log::trace!("{}: trip count unknown or above {}", l.id, max),
        }
    });
    plans
}

fn is_unrollable(body: &[Statement], state: &LoopState) -> bool {
    let [terminator] = state.terminators.as_slice() else {
        return false;
    };
    let [iv] = state.induction_variables.as_slice() else {
        return false;
    };
    if terminator.index != 0 || iv.init.is_none() {
        return false;
    }
    let rest = &body[1..];
    let mut nested_loop = false;
    visit::walk_statements(rest, &mut |s| nested_loop |= matches!(s, Statement::Loop(_)));
    !nested_loop && !visit::contains_loop_jump(rest)
}

/// Number of iterations before the terminator fires, if it fires within
/// `max` iterations.
fn trip_count(state: &LoopState, vars: &VarTable, max: u32) -> Option<u32> {
    let iv = state.induction_variables.first()?;
    let terminator = state.terminators.first()?;
    let ty = vars.ty(iv.var);
    let mut value: Constant = iv.init.clone()?;
    for count in 0..=max {
        let mut cond = terminator.condition.clone();
        visit::rewrite_rvalue(&mut cond, &mut |node| {
            if node.as_var() == Some(iv.var) {
                *node = Rvalue::Constant(value.clone());
                true
            } else {
                false
            }
        });
        eval::fold_rvalue(&mut cond);
        let exits = cond.as_constant()?.component(0)?.as_bool();
        if exits {
            return Some(count);
        }
        value = eval::evaluate(ExprOp::Add, &ty, &[&value, &iv.increment])?;
    }
    None
}

fn expand(list: &mut Vec<Statement>, plans: &BTreeMap<LoopId, u32>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < list.len() {
        let count = match &list[i] {
            Statement::Loop(l) => plans.get(&l.id).copied(),
            _ => None,
        };
        let Some(count) = count else {
            i += 1;
            continue;
        };
        let Statement::Loop(l) = list.remove(i) else {
            continue;
        };
        let iteration = &l.body[1..];
        let copies: Vec<Statement> = (0..count)
            .flat_map(|_| iteration.iter().cloned())
            .collect();
        let n = copies.len();
        list.splice(i..i, copies);
        i += n;
        changed = true;
    }
    changed
}

/// Simplify the unrolled code until nothing changes.
fn cleanup(unit: &mut Unit, ctx: &PassContext<'_>) {
    let compiler = &ctx.options.compiler;
    let jumps = PassArgs::LowerJumps(LowerJumpsOptions {
        pull_out_jumps: true,
        lower_sub_return: true,
        lower_main_return: compiler.emit_no_main_return,
        lower_continue: compiler.emit_no_cont,
        lower_break: compiler.emit_no_loops,
    });
    for _ in 0..ctx.options.max_passes {
        let mut progress = ctx.run_nested(PassId::ConstantPropagation, &PassArgs::None, unit);
        progress |= ctx.run_nested(PassId::IfSimplification, &PassArgs::None, unit);
        progress |= ctx.run_nested(PassId::LowerJumps, &jumps, unit);
        if !progress {
            break;
        }
    }
}
