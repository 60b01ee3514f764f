//! Constant propagation: replace reads of variables holding a known
//! constant.

use alloc::collections::BTreeMap;

use glopt_ir::{visit, Constant, Deref, Rvalue, Statement, Unit, VarId, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
    passes::{is_plain_storage, written_vars},
};

/// Forward propagation of whole-variable constant assignments.
///
/// Facts flow down a statement list and into nested branches. Any write
/// kills a fact, including writes inside nested statements and through
/// call arguments. Loop bodies start without the facts of variables the
/// loop writes. Each function body starts empty.
#[derive(Debug)]
pub struct ConstantPropagation;

type Facts = BTreeMap<VarId, Constant>;

impl Pass for ConstantPropagation {
    fn id(&self) -> PassId {
        PassId::ConstantPropagation
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let vars = &unit.vars;
        let mut facts = Facts::new();
        propagate(&mut unit.items, &mut facts, vars)
    }
}

fn substitute(rv: &mut Rvalue, facts: &Facts) -> bool {
    if facts.is_empty() {
        return false;
    }
    visit::rewrite_rvalue(rv, &mut |node| match node.as_var().and_then(|v| facts.get(&v)) {
        Some(c) => {
            *node = Rvalue::constant(c.clone());
            true
        }
        None => false,
    })
}

/// Substitute into the index operands of a store destination, leaving the
/// stored-to variable itself in place.
fn substitute_path(d: &mut Deref, facts: &Facts) -> bool {
    match d {
        Deref::Var(_) => false,
        Deref::Array { array, index } => {
            let mut changed = substitute(index, facts);
            if let Rvalue::Deref(inner) = &mut **array {
                changed |= substitute_path(inner, facts);
            }
            changed
        }
        Deref::Record { record, .. } => match &mut **record {
            Rvalue::Deref(inner) => substitute_path(inner, facts),
            _ => false,
        },
    }
}

fn kill_all(facts: &mut Facts, stmts: &[Statement]) {
    if facts.is_empty() {
        return;
    }
    for v in written_vars(stmts) {
        facts.remove(&v);
    }
}

fn propagate(stmts: &mut [Statement], facts: &mut Facts, vars: &VarTable) -> bool {
    let mut changed = false;
    for stmt in stmts.iter_mut() {
        match stmt {
            Statement::Function(f) => {
                for sig in &mut f.signatures {
                    changed |= propagate(&mut sig.body, &mut Facts::new(), vars);
                }
            }
            Statement::If(i) => {
                changed |= substitute(&mut i.condition, facts);
                changed |= propagate(&mut i.then_body, &mut facts.clone(), vars);
                changed |= propagate(&mut i.else_body, &mut facts.clone(), vars);
                kill_all(facts, &i.then_body);
                kill_all(facts, &i.else_body);
            }
            Statement::Loop(l) => {
                kill_all(facts, &l.body);
                changed |= propagate(&mut l.body, &mut facts.clone(), vars);
            }
            Statement::Call(c) => {
                // Arguments of user functions may be out parameters.
                if c.builtin {
                    for arg in &mut c.args {
                        changed |= substitute(arg, facts);
                    }
                } else {
                    for v in c.args.iter().filter_map(Rvalue::root_var) {
                        facts.remove(&v);
                    }
                }
                if let Some(d) = &mut c.return_deref {
                    changed |= substitute_path(d, facts);
                    if let Some(v) = d.root_var() {
                        facts.remove(&v);
                    }
                }
            }
            Statement::Assign(a) => {
                changed |= substitute_path(&mut a.lhs, facts);
                changed |= substitute(&mut a.rhs, facts);
                if let Some(cond) = &mut a.condition {
                    changed |= substitute(cond, facts);
                }
                if let Some(v) = a.lhs.root_var() {
                    facts.remove(&v);
                }
                if let (Some(v), Rvalue::Constant(c)) = (a.whole_var(vars), &a.rhs) {
                    if is_plain_storage(vars.mode(v)) && !vars.ty(v).is_sampler() {
                        facts.insert(v, c.clone());
                    }
                }
            }
            other => {
                for rv in visit::statement_rvalues_mut(other) {
                    changed |= substitute(rv, facts);
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{ExprOp, If, Type};

    use super::*;
    use crate::passes::test_util::*;

    #[test]
    fn test_propagates_into_following_reads() {
        let mut unit = Unit::new();
        let a = local(&mut unit, "a", Type::FLOAT);
        let b = local(&mut unit, "b", Type::FLOAT);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(a, float(2.0)),
                assign(b, add(Type::FLOAT, Rvalue::var(a), float(1.0))),
            ],
        );
        assert!(run(&ConstantPropagation, &mut unit));
        assert_eq!(
            main_body(&unit)[1],
            assign(b, add(Type::FLOAT, float(2.0), float(1.0)))
        );
        assert!(!run(&ConstantPropagation, &mut unit));
    }

    #[test]
    fn test_branch_write_kills_fact() {
        let mut unit = Unit::new();
        let a = local(&mut unit, "a", Type::FLOAT);
        let c = local(&mut unit, "c", Type::BOOL);
        let b = local(&mut unit, "b", Type::FLOAT);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(a, float(2.0)),
                Statement::If(If {
                    condition: Rvalue::var(c),
                    then_body: vec![assign(a, float(3.0))],
                    else_body: vec![],
                }),
                assign(b, Rvalue::var(a)),
            ],
        );
        assert!(!run(&ConstantPropagation, &mut unit));
        assert_eq!(main_body(&unit)[2], assign(b, Rvalue::var(a)));
    }

    #[test]
    fn test_loop_written_vars_not_propagated() {
        let mut unit = Unit::new();
        let i = local(&mut unit, "i", Type::INT);
        let lp = unit.new_loop(vec![
            if_break(Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(i), int(4))),
            assign(i, add(Type::INT, Rvalue::var(i), int(1))),
        ]);
        push_function(
            &mut unit,
            "main",
            vec![assign(i, int(0)), Statement::Loop(lp)],
        );
        assert!(!run(&ConstantPropagation, &mut unit));
    }
}
