//! Statements and structured control flow.
//!
//! Every loop form becomes an IR `Loop` with explicit breaks:
//! - `while (c) body` is `loop { if (!c) break; body }`
//! - `do body while (c)` is `loop { body; if (!c) break; }`
//! - `for (init; c; step) body` is `init; loop { if (!c) break; body; step }`
//!
//! A `continue` replays the step (or the do-while check) before jumping.

use alloc::{format, vec::Vec};

use glopt_ir::{If, LoopJump, ShaderStage, Statement};
use glsl::syntax::{
    Condition, ForInitStatement, IterationStatement, JumpStatement, SelectionRestStatement,
    SelectionStatement, SimpleStatement, Statement as SynStatement,
};

use super::Lowerer;
use crate::error::{GlslError, GlslResult};

impl Lowerer<'_> {
    pub(super) fn statement(&mut self, s: &SynStatement) -> GlslResult<()> {
        match s {
            SynStatement::Compound(c) => {
                let (_, body) = self.scoped(|this| {
                    for stmt in &c.statement_list {
                        this.statement(stmt)?;
                    }
                    Ok(())
                })?;
                for stmt in body {
                    self.emit(stmt);
                }
                Ok(())
            }
            SynStatement::Simple(s) => self.simple_statement(s),
        }
    }

    fn simple_statement(&mut self, s: &SimpleStatement) -> GlslResult<()> {
        match s {
            SimpleStatement::Declaration(d) => self.declaration(d),
            SimpleStatement::Expression(Some(e)) => self.effect(e),
            SimpleStatement::Expression(None) => Ok(()),
            SimpleStatement::Selection(sel) => self.selection(sel),
            SimpleStatement::Switch(_) => Err(GlslError::unsupported("switch statements")),
            SimpleStatement::CaseLabel(_) => Err(GlslError::unsupported("case labels")),
            SimpleStatement::Iteration(it) => self.iteration(it),
            SimpleStatement::Jump(j) => self.jump(j),
        }
    }

    /// Lower a nested statement in its own scope.
    fn nested(&mut self, s: &SynStatement) -> GlslResult<Vec<Statement>> {
        self.scoped(|this| this.statement(s)).map(|(_, body)| body)
    }

    fn selection(&mut self, sel: &SelectionStatement) -> GlslResult<()> {
        let cond = self.rvalue(&sel.cond)?;
        let condition = self.condition(cond, "if condition")?;
        let (then_body, else_body) = match &sel.rest {
            SelectionRestStatement::Statement(s) => (self.nested(s)?, Vec::new()),
            SelectionRestStatement::Else(a, b) => (self.nested(a)?, self.nested(b)?),
        };
        self.emit(Statement::If(If {
            condition,
            then_body,
            else_body,
        }));
        Ok(())
    }

    fn loop_condition(&mut self, c: &Condition) -> GlslResult<()> {
        match c {
            Condition::Expr(e) => {
                let cond = self.rvalue(e)?;
                let cond = self.condition(cond, "loop condition")?;
                self.break_unless(cond);
                Ok(())
            }
            Condition::Assignment(..) => Err(GlslError::unsupported(
                "declarations in loop conditions",
            )),
        }
    }

    /// Lower a loop body with `prologue` replayed before each `continue`.
    fn loop_body(&mut self, body: &SynStatement, prologue: Vec<Statement>) -> GlslResult<()> {
        self.continue_prologues.push(prologue);
        let result = self.nested(body);
        self.continue_prologues.pop();
        for stmt in result? {
            self.emit(stmt);
        }
        Ok(())
    }

    /// Move declarations out of statements that will be replayed, so each
    /// temporary is declared once in front of the loop.
    fn hoist_declarations(&mut self, stmts: Vec<Statement>) -> Vec<Statement> {
        let (decls, rest): (Vec<_>, Vec<_>) = stmts
            .into_iter()
            .partition(|s| matches!(s, Statement::Declare(_)));
        for decl in decls {
            self.emit(decl);
        }
        rest
    }

    fn iteration(&mut self, it: &IterationStatement) -> GlslResult<()> {
        match it {
            IterationStatement::While(cond, body) => {
                let (_, stmts) = self.scoped(|this| {
                    this.loop_condition(cond)?;
                    this.loop_body(body, Vec::new())
                })?;
                let lp = self.unit.new_loop(stmts);
                self.emit(Statement::Loop(lp));
            }
            IterationStatement::DoWhile(body, cond) => {
                let (_, check) = self.collect(|this| {
                    let c = this.rvalue(cond)?;
                    let c = this.condition(c, "loop condition")?;
                    this.break_unless(c);
                    Ok(())
                })?;
                let check = self.hoist_declarations(check);
                let (_, mut stmts) = self.collect(|this| this.loop_body(body, check.clone()))?;
                stmts.extend(check);
                let lp = self.unit.new_loop(stmts);
                self.emit(Statement::Loop(lp));
            }
            IterationStatement::For(init, rest, body) => {
                self.symbols.push_scope();
                let result = self.for_loop(init, rest, body);
                self.symbols.pop_scope();
                result?;
            }
        }
        Ok(())
    }

    fn for_loop(
        &mut self,
        init: &ForInitStatement,
        rest: &glsl::syntax::ForRestStatement,
        body: &SynStatement,
    ) -> GlslResult<()> {
        match init {
            ForInitStatement::Expression(Some(e)) => self.effect(e)?,
            ForInitStatement::Expression(None) => {}
            ForInitStatement::Declaration(d) => self.declaration(d)?,
        }
        let (_, step) = self.collect(|this| match &rest.post_expr {
            Some(e) => this.effect(e),
            None => Ok(()),
        })?;
        let step = self.hoist_declarations(step);
        let (_, stmts) = self.collect(|this| {
            if let Some(cond) = &rest.condition {
                this.loop_condition(cond)?;
            }
            this.loop_body(body, step.clone())?;
            for stmt in step {
                this.emit(stmt);
            }
            Ok(())
        })?;
        let lp = self.unit.new_loop(stmts);
        self.emit(Statement::Loop(lp));
        Ok(())
    }

    fn jump(&mut self, j: &JumpStatement) -> GlslResult<()> {
        match j {
            JumpStatement::Continue => {
                let prologue = self
                    .continue_prologues
                    .last()
                    .cloned()
                    .ok_or_else(|| GlslError::type_error("continue outside of a loop"))?;
                for stmt in prologue {
                    self.emit(stmt);
                }
                self.emit(Statement::LoopJump(LoopJump::Continue));
            }
            JumpStatement::Break => {
                if self.continue_prologues.is_empty() {
                    return Err(GlslError::type_error("break outside of a loop"));
                }
                self.emit(Statement::LoopJump(LoopJump::Break));
            }
            JumpStatement::Return(value) => {
                let ret = self
                    .return_type
                    .clone()
                    .ok_or_else(|| GlslError::type_error("return outside of a function"))?;
                let value = match (value, ret.is_void()) {
                    (None, true) => None,
                    (Some(e), false) => {
                        let v = self.rvalue(e)?;
                        Some(self.coerce(v, &ret)?)
                    }
                    (None, false) => {
                        return Err(GlslError::type_error(format!(
                            "function returning {} needs a return value",
                            ret.name()
                        )))
                    }
                    (Some(_), true) => {
                        return Err(GlslError::type_error("void function cannot return a value"))
                    }
                };
                self.emit(Statement::Return(value));
            }
            JumpStatement::Discard => {
                if self.target.stage != ShaderStage::Fragment {
                    return Err(GlslError::type_error(
                        "discard is only allowed in fragment shaders",
                    ));
                }
                if self.return_type.is_none() {
                    return Err(GlslError::type_error("discard outside of a function"));
                }
                self.emit(Statement::Discard(None));
            }
        }
        Ok(())
    }
}
