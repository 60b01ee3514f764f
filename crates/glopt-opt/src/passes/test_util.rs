//! Unit builders shared by the pass tests.

use alloc::{string::String, vec::Vec};

use glopt_ir::{
    Constant, Deref, ExprOp, Function, If, LoopJump, Rvalue, Signature, Statement, StorageMode,
    Target, Type, Unit, VarId, Variable,
};

use crate::{
    options::OptimizationOptions,
    pass::{Pass, PassContext, PassLibrary},
    pass_id::PassArgs,
};

pub fn var(unit: &mut Unit, name: &str, ty: Type, mode: StorageMode) -> VarId {
    unit.add_var(Variable::new(Some(String::from(name)), ty, mode))
}

pub fn local(unit: &mut Unit, name: &str, ty: Type) -> VarId {
    var(unit, name, ty, StorageMode::Auto)
}

/// Append a defined, parameterless `void name()` with `body`.
pub fn push_function(unit: &mut Unit, name: &str, body: Vec<Statement>) {
    let mut f = Function::new(String::from(name));
    let mut sig = Signature::new(Type::Void, Vec::new());
    sig.is_defined = true;
    sig.body = body;
    f.signatures.push(sig);
    unit.items.push(Statement::Function(f));
}

pub fn main_body(unit: &Unit) -> &Vec<Statement> {
    &unit.main_signature("main").expect("main").body
}

pub fn assign(v: VarId, rhs: Rvalue) -> Statement {
    Statement::assign(Deref::Var(v), rhs)
}

pub fn float(v: f32) -> Rvalue {
    Rvalue::constant(Constant::float(v))
}

pub fn int(v: i32) -> Rvalue {
    Rvalue::constant(Constant::int(v))
}

pub fn add(ty: Type, a: Rvalue, b: Rvalue) -> Rvalue {
    Rvalue::binop(ExprOp::Add, ty, a, b)
}

pub fn if_break(condition: Rvalue) -> Statement {
    Statement::If(If {
        condition,
        then_body: alloc::vec![Statement::LoopJump(LoopJump::Break)],
        else_body: Vec::new(),
    })
}

/// Run `pass` once with `args` and default options.
pub fn run_with(pass: &dyn Pass, unit: &mut Unit, args: PassArgs) -> bool {
    let options = OptimizationOptions::default();
    let target = Target::default();
    let library = PassLibrary::with_builtins();
    let ctx = PassContext {
        target: &target,
        args: &args,
        options: &options,
        library: &library,
    };
    pass.run(unit, &ctx)
}

pub fn run(pass: &dyn Pass, unit: &mut Unit) -> bool {
    run_with(pass, unit, PassArgs::None)
}
