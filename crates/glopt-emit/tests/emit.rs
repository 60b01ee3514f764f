//! Emitter integration tests over hand-built units.

use glopt_emit::{GlslEmitter, TreeEmitter};
use glopt_ir::{
    BaseType, Constant, Deref, ExprOp, Function, If, LoopJump, Rvalue, ShaderStage, Signature,
    Statement, StorageMode, Target, Type, Unit, VarId, Variable,
};

fn var(unit: &mut Unit, name: &str, ty: Type, mode: StorageMode) -> VarId {
    unit.add_var(Variable::new(Some(String::from(name)), ty, mode))
}

fn function(unit: &mut Unit, name: &str, body: Vec<Statement>) {
    let mut f = Function::new(String::from(name));
    let mut sig = Signature::new(Type::Void, Vec::new());
    sig.is_defined = true;
    sig.body = body;
    f.signatures.push(sig);
    unit.items.push(Statement::Function(f));
}

/// Global `float g = 0.25;` initializer, a helper with a local named like a
/// global, and a counting loop in main.
fn sample_unit() -> Unit {
    let mut unit = Unit::new();
    let vec4 = Type::Vector(BaseType::Float, 4);
    let g = var(&mut unit, "g", Type::FLOAT, StorageMode::Auto);
    let color = var(&mut unit, "color", vec4.clone(), StorageMode::ShaderOut);
    let shadow = var(&mut unit, "g", Type::FLOAT, StorageMode::Auto);
    let i = var(&mut unit, "i", Type::INT, StorageMode::Auto);

    unit.items.push(Statement::Declare(g));
    unit.items.push(Statement::Declare(color));
    unit.items.push(Statement::assign(
        Deref::Var(g),
        Rvalue::constant(Constant::float(0.25)),
    ));

    function(
        &mut unit,
        "helper",
        vec![
            Statement::Declare(shadow),
            Statement::assign(Deref::Var(shadow), Rvalue::var(g)),
        ],
    );

    let lp = unit.new_loop(vec![
        Statement::If(If {
            condition: Rvalue::binop(
                ExprOp::Gequal,
                Type::BOOL,
                Rvalue::var(i),
                Rvalue::constant(Constant::int(4)),
            ),
            then_body: vec![Statement::LoopJump(LoopJump::Break)],
            else_body: Vec::new(),
        }),
        Statement::assign(
            Deref::Var(g),
            Rvalue::binop(
                ExprOp::Mul,
                Type::FLOAT,
                Rvalue::var(g),
                Rvalue::constant(Constant::float(2.0)),
            ),
        ),
        Statement::assign(
            Deref::Var(i),
            Rvalue::binop(
                ExprOp::Add,
                Type::INT,
                Rvalue::var(i),
                Rvalue::constant(Constant::int(1)),
            ),
        ),
    ]);
    function(
        &mut unit,
        "main",
        vec![
            Statement::Declare(i),
            Statement::assign(Deref::Var(i), Rvalue::constant(Constant::int(0))),
            Statement::Loop(lp),
            Statement::assign(
                Deref::Var(color),
                Rvalue::Swizzle(Box::new(glopt_ir::Swizzle {
                    val: Rvalue::var(g),
                    mask: glopt_ir::SwizzleMask::parse("xxxx").unwrap(),
                })),
            ),
        ],
    );
    unit
}

#[test]
fn test_source_output() {
    let target = Target::new(130, ShaderStage::Fragment);
    let text = GlslEmitter::new(&target).emit(&sample_unit());
    let expected = "\
#version 130
float g;
out vec4 color;
//;
void helper()
{
  float g_1;
  g_1 = g;
}
void main()
{
  g = 0.25;
  for (int i = 0; i < 4; i++)
  {
    g = (g * 2.0);
  }
  color = vec4(g);
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_tree_output_keeps_structure() {
    let text = TreeEmitter::new().emit(&sample_unit());
    // Nothing is hoisted or reconstructed.
    assert!(text.contains("\n(assign (x) (var_ref g) (constant float (0.250000)))\n"));
    assert!(text.contains("(loop (\n"));
    assert!(!text.contains("for ("));
    assert!(text.contains("(declare () float g@1)"));
    assert!(text.contains("(swiz xxxx (var_ref g))"));
}

#[test]
fn test_emitters_are_reusable() {
    let unit = sample_unit();
    let target = Target::new(330, ShaderStage::Fragment);
    let glsl = GlslEmitter::new(&target);
    assert_eq!(glsl.emit(&unit), glsl.emit(&unit));
    let tree = TreeEmitter::new();
    assert_eq!(tree.emit(&unit), tree.emit(&unit));
}
