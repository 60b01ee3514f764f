//! Loop analysis: induction variables and terminators.
//!
//! A loop is recognized in the shape produced for `for` loops:
//!
//! ```text
//! i = 0;                      // init, in the enclosing list
//! loop {
//!     if (i >= 10) break;     // terminator(s), leading the body
//!     ...
//!     i = i + 1;              // induction update(s), ending the body
//! }
//! ```
//!
//! Positions recorded here index the statement list that contains the loop
//! (for init and declaration) or the loop body (for terminators and updates).

use alloc::{collections::BTreeMap, vec::Vec};

use crate::{
    visit::{nested_bodies, var_usage},
    Constant, ExprOp, LoopId, LoopJump, Rvalue, Statement, StorageMode, Type, Unit, VarId,
    VarTable,
};

/// A loop exit condition: `if (condition) break;`.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminator {
    /// Condition under which the loop exits
    pub condition: Rvalue,
    /// Position in the loop body
    pub index: usize,
}

/// A variable stepped by a constant once per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct InductionVariable {
    pub var: VarId,
    /// Constant added on every iteration
    pub increment: Constant,
    /// Position of the update in the loop body
    pub update_index: usize,
    /// Value assigned right before the loop
    pub init: Option<Constant>,
    /// Position of the init assignment in the enclosing list
    pub init_index: Option<usize>,
    /// Position of the declaration in the enclosing list
    pub declaration_index: Option<usize>,
    /// The declaration may move into a `for` header
    pub hoistable_declaration: bool,
}

/// Analysis result for one loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopState {
    pub induction_variables: Vec<InductionVariable>,
    pub terminators: Vec<Terminator>,
}

impl LoopState {
    /// Induction variable record for `var`.
    pub fn induction_variable(&self, var: VarId) -> Option<&InductionVariable> {
        self.induction_variables.iter().find(|iv| iv.var == var)
    }
}

/// Loop states of a whole unit, keyed by loop identity.
#[derive(Debug, Clone, Default)]
pub struct LoopAnalysis {
    loops: BTreeMap<LoopId, LoopState>,
}

impl LoopAnalysis {
    /// Analyze every loop of `unit`.
    pub fn analyze(unit: &Unit) -> Self {
        let mut analysis = Self::default();
        analysis.analyze_list(&unit.items, &unit.vars);
        analysis
    }

    pub fn get(&self, id: LoopId) -> Option<&LoopState> {
        self.loops.get(&id)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LoopId, &LoopState)> + '_ {
        self.loops.iter().map(|(id, s)| (*id, s))
    }

    fn analyze_list(&mut self, list: &[Statement], vars: &VarTable) {
        for (pos, stmt) in list.iter().enumerate() {
            if let Statement::Loop(l) = stmt {
                let state = analyze_loop(list, pos, &l.body, vars);
                self.loops.insert(l.id, state);
            }
            for body in nested_bodies(stmt) {
                self.analyze_list(body, vars);
            }
        }
    }
}

fn analyze_loop(list: &[Statement], pos: usize, body: &[Statement], vars: &VarTable) -> LoopState {
    let terminators = leading_terminators(body);
    let mut state = LoopState {
        terminators,
        induction_variables: Vec::new(),
    };

    // `continue` skips trailing updates, so they would not run every
    // iteration.
    if has_continue(body) {
        return state;
    }

    let usage = var_usage(body);
    let first_candidate = state.terminators.len();
    for index in (first_candidate..body.len()).rev() {
        let Some((var, increment)) = induction_update(&body[index], vars) else {
            break;
        };
        if state.induction_variables.iter().any(|iv| iv.var == var) {
            break;
        }
        if usage.get(&var).map_or(0, |u| u.writes) != 1 {
            break;
        }
        let mut iv = InductionVariable {
            var,
            increment,
            update_index: index,
            init: None,
            init_index: None,
            declaration_index: None,
            hoistable_declaration: false,
        };
        find_init(list, pos, &mut iv, vars);
        state.induction_variables.push(iv);
    }
    state.induction_variables.reverse();
    state
}

/// `if (c) break;` statements at the start of the body.
fn leading_terminators(body: &[Statement]) -> Vec<Terminator> {
    body.iter()
        .enumerate()
        .map_while(|(index, stmt)| match stmt {
            Statement::If(i)
                if i.else_body.is_empty()
                    && i.then_body == [Statement::LoopJump(LoopJump::Break)] =>
            {
                Some(Terminator {
                    condition: i.condition.clone(),
                    index,
                })
            }
            _ => None,
        })
        .collect()
}

/// `continue` applying to this loop.
fn has_continue(stmts: &[Statement]) -> bool {
    stmts.iter().any(|s| match s {
        Statement::LoopJump(LoopJump::Continue) => true,
        Statement::If(i) => has_continue(&i.then_body) || has_continue(&i.else_body),
        _ => false,
    })
}

/// Match `v = v + c` or `v = c + v`.
fn induction_update(stmt: &Statement, vars: &VarTable) -> Option<(VarId, Constant)> {
    let a = stmt.as_assign()?;
    let var = a.whole_var(vars)?;
    let ty = vars.ty(var);
    if !matches!(ty, Type::Scalar(b) if b.is_integer() || b == crate::BaseType::Float) {
        return None;
    }
    let e = a.rhs.as_expression()?;
    if e.op != ExprOp::Add || e.operands.len() != 2 {
        return None;
    }
    let (x, y) = (&e.operands[0], &e.operands[1]);
    let c = if x.as_var() == Some(var) {
        y.as_constant()?
    } else if y.as_var() == Some(var) {
        x.as_constant()?
    } else {
        return None;
    };
    if c.ty != ty {
        return None;
    }
    Some((var, c.clone()))
}

/// Find the init assignment and declaration of `iv` before the loop at
/// `pos`.
fn find_init(list: &[Statement], pos: usize, iv: &mut InductionVariable, vars: &VarTable) {
    let var = iv.var;
    let touches = |stmt: &Statement| {
        var_usage(core::slice::from_ref(stmt))
            .get(&var)
            .map_or(false, |u| u.is_referenced() || u.declarations > 0)
    };

    let Some(init_index) = (0..pos).rev().find(|i| touches(&list[*i])) else {
        return;
    };
    let Some(assign) = list[init_index].as_assign() else {
        return;
    };
    let Some(value) = assign.rhs.as_constant() else {
        return;
    };
    if assign.whole_var(vars) != Some(var) {
        return;
    }
    iv.init = Some(value.clone());
    iv.init_index = Some(init_index);

    let decl = (0..init_index)
        .rev()
        .find(|i| touches(&list[*i]))
        .filter(|i| list[*i] == Statement::Declare(var));
    iv.declaration_index = decl;

    let local = matches!(vars.mode(var), StorageMode::Auto | StorageMode::Temporary);
    let used_after = list[pos + 1..].iter().any(touches);
    iv.hoistable_declaration = decl.is_some() && local && !used_after;
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;
    use crate::{Deref, Function, If, Signature, Variable};

    struct Fixture {
        unit: Unit,
        i: VarId,
        j: VarId,
        sum: VarId,
    }

    fn fixture() -> Fixture {
        let mut unit = Unit::new();
        let i = unit.add_var(Variable::new(Some("i".to_string()), Type::INT, StorageMode::Auto));
        let j = unit.add_var(Variable::new(Some("j".to_string()), Type::INT, StorageMode::Auto));
        let sum = unit.add_var(Variable::new(
            Some("sum".to_string()),
            Type::INT,
            StorageMode::Auto,
        ));
        Fixture { unit, i, j, sum }
    }

    fn terminator(var: VarId, limit: i32) -> Statement {
        Statement::If(If {
            condition: Rvalue::binop(
                ExprOp::Gequal,
                Type::BOOL,
                Rvalue::var(var),
                Rvalue::constant(Constant::int(limit)),
            ),
            then_body: vec![Statement::LoopJump(LoopJump::Break)],
            else_body: Vec::new(),
        })
    }

    fn step(var: VarId, by: i32) -> Statement {
        Statement::assign(
            Deref::Var(var),
            Rvalue::binop(
                ExprOp::Add,
                Type::INT,
                Rvalue::var(var),
                Rvalue::constant(Constant::int(by)),
            ),
        )
    }

    fn init(var: VarId, value: i32) -> Statement {
        Statement::assign(Deref::Var(var), Rvalue::constant(Constant::int(value)))
    }

    fn wrap_main(unit: &mut Unit, body: Vec<Statement>) {
        let mut main = Function::new("main".to_string());
        let mut sig = Signature::new(Type::Void, Vec::new());
        sig.is_defined = true;
        sig.body = body;
        main.signatures.push(sig);
        unit.items.push(Statement::Function(main));
    }

    #[test]
    fn test_canonical_counting_loop() {
        let Fixture { mut unit, i, sum, .. } = fixture();
        let lp = unit.new_loop(vec![
            terminator(i, 10),
            Statement::assign(
                Deref::Var(sum),
                Rvalue::binop(ExprOp::Add, Type::INT, Rvalue::var(sum), Rvalue::var(i)),
            ),
            step(i, 1),
        ]);
        let id = lp.id;
        wrap_main(
            &mut unit,
            vec![
                Statement::Declare(sum),
                init(sum, 0),
                Statement::Declare(i),
                init(i, 0),
                Statement::Loop(lp),
            ],
        );

        let analysis = LoopAnalysis::analyze(&unit);
        let state = analysis.get(id).unwrap();
        assert_eq!(state.terminators.len(), 1);
        assert_eq!(state.induction_variables.len(), 1);
        let iv = &state.induction_variables[0];
        assert_eq!(iv.var, i);
        assert_eq!(iv.update_index, 2);
        assert_eq!(iv.init, Some(Constant::int(0)));
        assert_eq!(iv.init_index, Some(3));
        assert_eq!(iv.declaration_index, Some(2));
        assert!(iv.hoistable_declaration);
        // `sum` is read-modify-written with a variable, not a constant.
        assert!(state.induction_variable(sum).is_none());
    }

    #[test]
    fn test_two_induction_variables() {
        let Fixture { mut unit, i, j, .. } = fixture();
        let lp = unit.new_loop(vec![terminator(i, 4), step(i, 1), step(j, 2)]);
        let id = lp.id;
        wrap_main(
            &mut unit,
            vec![init(i, 0), init(j, 0), Statement::Loop(lp)],
        );
        let analysis = LoopAnalysis::analyze(&unit);
        let state = analysis.get(id).unwrap();
        assert_eq!(state.induction_variables.len(), 2);
        assert_eq!(state.induction_variables[0].var, i);
        assert_eq!(state.induction_variables[1].var, j);
        assert_eq!(state.induction_variables[1].init_index, Some(1));
        // no declaration in the list
        assert!(!state.induction_variables[0].hoistable_declaration);
    }

    #[test]
    fn test_used_after_loop_is_not_hoistable() {
        let Fixture { mut unit, i, sum, .. } = fixture();
        let lp = unit.new_loop(vec![terminator(i, 3), step(i, 1)]);
        let id = lp.id;
        wrap_main(
            &mut unit,
            vec![
                Statement::Declare(i),
                init(i, 0),
                Statement::Loop(lp),
                Statement::assign(Deref::Var(sum), Rvalue::var(i)),
            ],
        );
        let analysis = LoopAnalysis::analyze(&unit);
        let iv = &analysis.get(id).unwrap().induction_variables[0];
        assert_eq!(iv.init_index, Some(1));
        assert!(!iv.hoistable_declaration);
    }

    #[test]
    fn test_continue_disables_induction() {
        let Fixture { mut unit, i, .. } = fixture();
        let lp = unit.new_loop(vec![
            terminator(i, 3),
            Statement::LoopJump(LoopJump::Continue),
            step(i, 1),
        ]);
        let id = lp.id;
        wrap_main(&mut unit, vec![init(i, 0), Statement::Loop(lp)]);
        let analysis = LoopAnalysis::analyze(&unit);
        let state = analysis.get(id).unwrap();
        assert_eq!(state.terminators.len(), 1);
        assert!(state.induction_variables.is_empty());
    }

    #[test]
    fn test_intervening_read_blocks_init() {
        let Fixture { mut unit, i, sum, .. } = fixture();
        let lp = unit.new_loop(vec![terminator(i, 3), step(i, 1)]);
        let id = lp.id;
        wrap_main(
            &mut unit,
            vec![
                init(i, 0),
                Statement::assign(Deref::Var(sum), Rvalue::var(i)),
                Statement::Loop(lp),
            ],
        );
        let analysis = LoopAnalysis::analyze(&unit);
        let iv = &analysis.get(id).unwrap().induction_variables[0];
        assert_eq!(iv.init, None);
    }

    #[test]
    fn test_double_write_is_not_induction() {
        let Fixture { mut unit, i, .. } = fixture();
        let lp = unit.new_loop(vec![terminator(i, 3), step(i, 1), step(i, 1)]);
        let id = lp.id;
        wrap_main(&mut unit, vec![Statement::Loop(lp)]);
        let analysis = LoopAnalysis::analyze(&unit);
        assert!(analysis.get(id).unwrap().induction_variables.is_empty());
    }
}
