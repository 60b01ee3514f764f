//! Lowering from the glsl-parser syntax tree to the IR.
//!
//! The [`Lowerer`] walks external declarations in source order, type checks
//! as it goes and appends IR statements to the innermost open statement
//! list. Expressions that need statements (calls, short-circuit operators,
//! constructors with variable operands) emit them into the current list and
//! hand back the value.

mod call;
mod constructor;
mod convert;
mod decl;
mod expr;
mod stmt;
mod texture;

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{
    Constant, ExprOp, If, LoopJump, Rvalue, Statement, StorageMode, Target, Type, Unit, VarId,
    Variable,
};
use glsl::syntax::{ExternalDeclaration, TranslationUnit};

use crate::{
    builtins,
    error::{GlslError, GlslResult},
    symbols::SymbolTable,
};

/// Lower a parsed translation unit for `target`.
pub fn lower(tu: &TranslationUnit, target: &Target) -> GlslResult<Unit> {
    Lowerer::new(target).translation_unit(tu)
}

/// Syntax-tree-to-IR translator for one translation unit.
pub struct Lowerer<'a> {
    target: &'a Target,
    unit: Unit,
    symbols: SymbolTable,
    /// Statement lists under construction, innermost last; index 0 holds
    /// the top-level items
    blocks: Vec<Vec<Statement>>,
    /// Per enclosing loop, statements replayed in front of `continue`
    continue_prologues: Vec<Vec<Statement>>,
    /// Return type of the function being lowered
    return_type: Option<Type>,
}

impl<'a> Lowerer<'a> {
    pub fn new(target: &'a Target) -> Self {
        Self {
            target,
            unit: Unit::new(),
            symbols: SymbolTable::new(),
            blocks: alloc::vec![Vec::new()],
            continue_prologues: Vec::new(),
            return_type: None,
        }
    }

    /// Lower every external declaration and return the finished unit.
    pub fn translation_unit(mut self, tu: &TranslationUnit) -> GlslResult<Unit> {
        for decl in tu.0 .0.iter() {
            match decl {
                ExternalDeclaration::Preprocessor(p) => {
                    log::debug!("ignoring preprocessor directive {:?}", p);
                }
                ExternalDeclaration::Declaration(d) => self.declaration(d)?,
                ExternalDeclaration::FunctionDefinition(f) => self.function_definition(f)?,
            }
        }
        self.unit.items = self.blocks.pop().unwrap_or_default();
        Ok(self.unit)
    }

    fn emit(&mut self, stmt: Statement) {
        if let Some(block) = self.blocks.last_mut() {
            block.push(stmt);
        }
    }

    /// Run `f` against a fresh statement list and return what it emitted.
    fn collect<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> GlslResult<T>,
    ) -> GlslResult<(T, Vec<Statement>)> {
        self.blocks.push(Vec::new());
        let result = f(self);
        let stmts = self.blocks.pop().unwrap_or_default();
        result.map(|value| (value, stmts))
    }

    /// Like [`collect`](Self::collect), inside a new lexical scope.
    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> GlslResult<T>,
    ) -> GlslResult<(T, Vec<Statement>)> {
        self.symbols.push_scope();
        let result = self.collect(f);
        self.symbols.pop_scope();
        result
    }

    fn in_global_scope(&self) -> bool {
        self.symbols.is_global_scope() && self.return_type.is_none()
    }

    /// Declare a compiler temporary in the current list.
    fn temp(&mut self, ty: Type) -> VarId {
        let id = self
            .unit
            .add_var(Variable::new(None, ty, StorageMode::Temporary));
        self.emit(Statement::Declare(id));
        id
    }

    /// Store `value` into a fresh temporary and return a reference to it.
    fn to_temp(&mut self, value: Rvalue) -> Rvalue {
        let ty = self.ty(&value);
        let t = self.temp(ty);
        self.emit(Statement::assign(glopt_ir::Deref::Var(t), value));
        Rvalue::var(t)
    }

    fn ty(&self, rv: &Rvalue) -> Type {
        rv.ty(&self.unit.vars)
    }

    fn var(&self, id: VarId) -> GlslResult<&Variable> {
        self.unit
            .vars
            .get(id)
            .ok_or_else(|| GlslError::type_error(format!("unknown variable {:?}", id)))
    }

    /// Resolve a variable name, declaring stage builtins on first use.
    fn lookup_variable(&mut self, name: &str) -> GlslResult<VarId> {
        if let Some(id) = self.symbols.lookup_variable(name) {
            return Ok(id);
        }
        let (ty, mode) = builtins::builtin_variable(name, self.target)
            .ok_or_else(|| GlslError::type_error(format!("'{}' undeclared identifier", name)))?;
        let id = self
            .unit
            .add_var(Variable::new(Some(name.to_string()), ty, mode));
        if let Some(globals) = self.blocks.first_mut() {
            globals.push(Statement::Declare(id));
        }
        self.symbols.declare_global(name, id);
        log::trace!("declared builtin {}", name);
        Ok(id)
    }

    fn declare_symbol(&mut self, name: &str, id: VarId) -> GlslResult<()> {
        self.symbols
            .declare_variable(name, id)
            .map_err(GlslError::type_error)
    }

    /// Boolean scalar operand of a condition.
    fn condition(&mut self, rv: Rvalue, what: &str) -> GlslResult<Rvalue> {
        let ty = self.ty(&rv);
        if ty != Type::BOOL {
            return Err(GlslError::type_error(format!(
                "{} must be a scalar boolean, found {}",
                what,
                ty.name()
            )));
        }
        Ok(rv)
    }

    /// `if (!(cond)) break;`, or nothing when `cond` is constant true.
    fn break_unless(&mut self, cond: Rvalue) {
        if let Some(c) = cond.as_constant() {
            if c.component(0).map(|v| v.as_bool()) == Some(true) {
                return;
            }
        }
        self.emit(Statement::If(If {
            condition: logical_not(cond),
            then_body: alloc::vec![Statement::LoopJump(LoopJump::Break)],
            else_body: Vec::new(),
        }));
    }

    /// Integer value of a constant expression.
    fn const_int(&mut self, e: &glsl::syntax::Expr, what: &str) -> GlslResult<i64> {
        let rv = self.rvalue(e)?;
        let c = self.fold_constant(rv).ok_or_else(|| {
            GlslError::type_error(format!("{} must be a constant expression", what))
        })?;
        if !c.ty.is_scalar() || !c.ty.is_integer() {
            return Err(GlslError::type_error(format!(
                "{} must be an integer, found {}",
                what,
                c.ty.name()
            )));
        }
        c.get_int_component(0)
            .ok_or_else(|| GlslError::type_error(format!("{} must be an integer", what)))
    }

    /// Fold `rv` completely, returning the constant if it is one.
    fn fold_constant(&self, mut rv: Rvalue) -> Option<Constant> {
        glopt_opt::eval::fold_rvalue(&mut rv);
        match rv {
            Rvalue::Constant(c) => Some(c),
            _ => None,
        }
    }
}

/// Logical negation, folded for constants.
fn logical_not(cond: Rvalue) -> Rvalue {
    let mut rv = Rvalue::unop(ExprOp::LogicNot, Type::BOOL, cond);
    glopt_opt::eval::fold_node(&mut rv);
    rv
}

/// Name used in diagnostics for a list of argument types.
fn type_list(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::name)
        .collect::<Vec<_>>()
        .join(", ")
}
