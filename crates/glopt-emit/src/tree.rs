//! Debug tree dump.
//!
//! Prints the IR literally in parenthesized prefix form, one fixed template
//! per node kind. Nothing is reconstructed: loops stay loops, global
//! statements stay where they are and builtins keep their IR operators.
//!
//! ```text
//! (
//! (declare (uniform) vec4 u)
//! (function main
//!   (signature void
//!     (parameters
//!     )
//!     (
//!       (assign (xyz) (var_ref o) (swiz xyz (var_ref u)))
//!     ))
//! )
//! )
//! ```

use alloc::{format, string::String, vec::Vec};

use glopt_ir::{
    mask_letters, Assignment, Constant, ConstantData, Deref, Expression, Function, Interpolation,
    LoopJump, Rvalue, Signature, Statement, StorageMode, StructType, Texture, TextureOp, Type,
    Unit, VarId, Variable,
};

use crate::context::PrintContext;

/// Prints a unit as a parenthesized tree.
#[derive(Debug, Clone, Default)]
pub struct TreeEmitter;

impl TreeEmitter {
    pub fn new() -> Self {
        Self
    }

    pub fn emit(&self, unit: &Unit) -> String {
        let mut printer = TreePrinter {
            unit,
            ctx: PrintContext::default(),
            out: String::new(),
            indent: 0,
        };
        for s in &unit.structs {
            printer.structure(s);
        }
        printer.push("(\n");
        for item in &unit.items {
            printer.statement(item);
        }
        printer.push(")\n");
        log::debug!("emitted {} bytes of tree dump", printer.out.len());
        printer.out
    }
}

struct TreePrinter<'a> {
    unit: &'a Unit,
    ctx: PrintContext,
    out: String,
    indent: usize,
}

impl TreePrinter<'_> {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn name(&mut self, id: VarId) -> String {
        let unit = self.unit;
        self.ctx.name(id, &unit.vars)
    }

    fn structure(&mut self, s: &StructType) {
        self.push(&format!("(structure ({}) ({})\n", s.name, s.fields.len()));
        for field in &s.fields {
            self.push(&format!("  (({}) ({}))\n", type_text(&field.ty), field.name));
        }
        self.push(")\n");
    }

    /// One statement on its own line(s), at the current indentation.
    fn statement(&mut self, stmt: &Statement) {
        self.line_start();
        match stmt {
            Statement::Declare(v) => self.declaration(*v),
            Statement::Assign(a) => self.assignment(a),
            Statement::Call(c) => {
                self.push("(call ");
                self.push(&c.callee);
                if let Some(ret) = &c.return_deref {
                    self.push(" ");
                    self.deref(ret);
                }
                self.push(" (");
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        self.push(" ");
                    }
                    self.rvalue(arg);
                }
                self.push("))");
            }
            Statement::If(i) => {
                self.push("(if ");
                self.rvalue(&i.condition);
                self.push(" (\n");
                self.body(&i.then_body);
                self.line_start();
                self.push(")\n");
                self.line_start();
                self.push("(\n");
                self.body(&i.else_body);
                self.line_start();
                self.push("))");
            }
            Statement::Loop(l) => {
                self.push("(loop (\n");
                self.body(&l.body);
                self.line_start();
                self.push("))");
            }
            Statement::LoopJump(LoopJump::Break) => self.push("break"),
            Statement::LoopJump(LoopJump::Continue) => self.push("continue"),
            Statement::Return(value) => self.optional_operand("return", value.as_ref()),
            Statement::Discard(cond) => self.optional_operand("discard", cond.as_ref()),
            Statement::EmitVertex(stream) => self.optional_operand("emit-vertex", Some(stream)),
            Statement::EndPrimitive(stream) => {
                self.optional_operand("end-primitive", Some(stream))
            }
            Statement::Barrier => self.push("(barrier)"),
            Statement::Function(f) => self.function(f),
        }
        self.push("\n");
    }

    fn body(&mut self, list: &[Statement]) {
        self.indent += 1;
        for stmt in list {
            self.statement(stmt);
        }
        self.indent -= 1;
    }

    fn optional_operand(&mut self, head: &str, operand: Option<&Rvalue>) {
        self.push("(");
        self.push(head);
        if let Some(v) = operand {
            self.push(" ");
            self.rvalue(v);
        }
        self.push(")");
    }

    fn function(&mut self, f: &Function) {
        self.push("(function ");
        self.push(&f.name);
        self.push("\n");
        self.indent += 1;
        for sig in &f.signatures {
            self.signature(sig);
        }
        self.indent -= 1;
        self.line_start();
        self.push(")");
    }

    fn signature(&mut self, sig: &Signature) {
        self.ctx.push_scope();
        self.line_start();
        self.push("(signature ");
        self.push(&type_text(&sig.return_type));
        self.push("\n");
        self.indent += 1;
        self.line_start();
        self.push("(parameters\n");
        self.indent += 1;
        for p in &sig.params {
            self.line_start();
            self.declaration(*p);
            self.push("\n");
        }
        self.indent -= 1;
        self.line_start();
        self.push(")\n");
        self.line_start();
        self.push("(\n");
        self.body(&sig.body);
        self.line_start();
        self.push("))\n");
        self.indent -= 1;
        self.ctx.pop_scope();
    }

    fn declaration(&mut self, id: VarId) {
        let unit = self.unit;
        let Some(var) = unit.vars.get(id) else {
            log::warn!("declaration of unknown variable {}", id);
            self.push("(declare () error error)");
            return;
        };
        let name = self.name(id);
        self.push(&format!(
            "(declare ({}) {} {})",
            qualifiers(var).join(" "),
            type_text(var.ty()),
            name
        ));
    }

    fn assignment(&mut self, a: &Assignment) {
        let unit = self.unit;
        self.push("(assign ");
        if let Some(cond) = &a.condition {
            self.rvalue(cond);
            self.push(" ");
        }
        self.push("(");
        self.push(&mask_letters(a.effective_mask(&unit.vars)));
        self.push(") ");
        self.deref(&a.lhs);
        self.push(" ");
        self.rvalue(&a.rhs);
        self.push(")");
    }

    fn rvalue(&mut self, rv: &Rvalue) {
        match rv {
            Rvalue::Expression(e) => self.expression(e),
            Rvalue::Texture(t) => self.texture(t),
            Rvalue::Swizzle(s) => {
                self.push("(swiz ");
                self.push(&s.mask.letters());
                self.push(" ");
                self.rvalue(&s.val);
                self.push(")");
            }
            Rvalue::Deref(d) => self.deref(d),
            Rvalue::Constant(c) => {
                let text = constant_text(c);
                self.push(&text);
            }
        }
    }

    fn deref(&mut self, d: &Deref) {
        match d {
            Deref::Var(id) => {
                let name = self.name(*id);
                self.push("(var_ref ");
                self.push(&name);
                self.push(")");
            }
            Deref::Array { array, index } => {
                self.push("(array_ref ");
                self.rvalue(array);
                self.push(" ");
                self.rvalue(index);
                self.push(")");
            }
            Deref::Record { record, field } => {
                let unit = self.unit;
                let field_name = match record.ty(&unit.vars) {
                    Type::Struct(s) => s.fields.get(*field).map(|f| f.name.clone()),
                    _ => None,
                };
                self.push("(record_ref ");
                self.rvalue(record);
                self.push(" ");
                self.push(field_name.as_deref().unwrap_or("error"));
                self.push(")");
            }
        }
    }

    fn expression(&mut self, e: &Expression) {
        self.push("(expression ");
        self.push(&type_text(&e.ty));
        self.push(" ");
        self.push(e.op.tree_name());
        for operand in &e.operands {
            self.push(" ");
            self.rvalue(operand);
        }
        self.push(")");
    }

    fn texture(&mut self, t: &Texture) {
        self.push("(");
        self.push(t.op.name());
        self.push(" ");
        self.push(&type_text(&t.ty));
        self.push(" ");
        self.deref(&t.sampler);
        if let Some(coord) = &t.coordinate {
            self.push(" ");
            self.rvalue(coord);
            self.push(" ");
            match &t.offset {
                Some(offset) => self.rvalue(offset),
                None => self.push("0"),
            }
        }
        if t.op.takes_projector() {
            self.push(" ");
            match &t.projector {
                Some(p) => self.rvalue(p),
                None => self.push("1"),
            }
            self.push(" ");
            match &t.shadow_comparator {
                Some(c) => self.rvalue(c),
                None => self.push("()"),
            }
        }
        match &t.op {
            TextureOp::Tex | TextureOp::Lod => {}
            TextureOp::Txb { bias: v }
            | TextureOp::Txl { lod: v }
            | TextureOp::Txf { lod: v }
            | TextureOp::Txs { lod: v }
            | TextureOp::TxfMs { sample_index: v } => {
                self.push(" ");
                self.rvalue(v);
            }
            TextureOp::Txd { dpdx, dpdy } => {
                self.push(" (");
                self.rvalue(dpdx);
                self.push(" ");
                self.rvalue(dpdy);
                self.push(")");
            }
        }
        self.push(")");
    }
}

/// `float`, `vec3` or `(array float 4)`.
fn type_text(ty: &Type) -> String {
    match ty {
        Type::Array(elem, n) => format!("(array {} {})", type_text(elem), n),
        other => other.name(),
    }
}

fn qualifiers(var: &Variable) -> Vec<String> {
    let d = &var.decorations;
    let mut words: Vec<String> = Vec::new();
    if let Some(l) = d.location {
        words.push(format!("location={}", l));
    }
    if let Some(b) = d.binding {
        words.push(format!("binding={}", b));
    }
    if let Some(f) = d.image_format {
        words.push(format!("format={}", f));
    }
    for (set, word) in [
        (d.centroid, "centroid"),
        (d.sample, "sample"),
        (d.patch, "patch"),
        (d.invariant, "invariant"),
        (d.precise, "precise"),
        (d.memory.read_only, "readonly"),
        (d.memory.write_only, "writeonly"),
        (d.memory.coherent, "coherent"),
        (d.memory.volatile, "volatile"),
        (d.memory.restrict, "restrict"),
        (d.bindless, "bindless_sampler"),
        (d.bound, "bound_sampler"),
    ] {
        if set {
            words.push(String::from(word));
        }
    }
    words.push(String::from(match var.mode() {
        StorageMode::Auto => "",
        StorageMode::Uniform => "uniform",
        StorageMode::ShaderStorage => "shader_storage",
        StorageMode::ShaderShared => "shader_shared",
        StorageMode::ShaderIn => "shader_in",
        StorageMode::ShaderOut => "shader_out",
        StorageMode::FunctionIn => "in",
        StorageMode::FunctionOut => "out",
        StorageMode::FunctionInOut => "inout",
        StorageMode::ConstIn => "const_in",
        StorageMode::SystemValue => "sys",
        StorageMode::Temporary => "temporary",
    }));
    if let Some(s) = d.stream {
        words.push(format!("stream{}", s));
    }
    match d.interpolation {
        Interpolation::None => {}
        Interpolation::Smooth => words.push(String::from("smooth")),
        Interpolation::Flat => words.push(String::from("flat")),
        Interpolation::NoPerspective => words.push(String::from("noperspective")),
    }
    words.retain(|w| !w.is_empty());
    words
}

/// `(constant type (values))`, with nested constants for aggregates.
fn constant_text(c: &Constant) -> String {
    let values: Vec<String> = match &c.data {
        ConstantData::Float(v) => v.iter().map(|x| float_text(*x as f64)).collect(),
        ConstantData::Double(v) => v.iter().map(|x| float_text(*x)).collect(),
        ConstantData::Int(v) => v.iter().map(|x| format!("{}", x)).collect(),
        ConstantData::UInt(v) => v.iter().map(|x| format!("{}", x)).collect(),
        ConstantData::Bool(v) => v.iter().map(|x| format!("{}", *x as u8)).collect(),
        ConstantData::Array(v) | ConstantData::Struct(v) => v.iter().map(constant_text).collect(),
    };
    format!("(constant {} ({}))", type_text(&c.ty), values.join(" "))
}

/// Six decimals, switching to exponent form where they would lose the value.
fn float_text(v: f64) -> String {
    let abs = v.abs();
    if abs != 0.0 && v.is_finite() && !(1e-4..1e16).contains(&abs) {
        format!("{:e}", v)
    } else {
        format!("{:.6}", v)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use glopt_ir::{BaseType, If, StructField, SwizzleMask};

    use super::*;

    fn main_with(unit: &mut Unit, body: Vec<Statement>) {
        let mut f = Function::new("main".to_string());
        let mut sig = Signature::new(Type::Void, Vec::new());
        sig.is_defined = true;
        sig.body = body;
        f.signatures.push(sig);
        unit.items.push(Statement::Function(f));
    }

    #[test]
    fn test_function_layout() {
        let mut unit = Unit::new();
        let u = unit.add_var(Variable::new(
            Some("u".to_string()),
            Type::Vector(BaseType::Float, 4),
            StorageMode::Uniform,
        ));
        let o = unit.add_var(Variable::new(
            Some("o".to_string()),
            Type::Vector(BaseType::Float, 3),
            StorageMode::ShaderOut,
        ));
        unit.items.push(Statement::Declare(u));
        let mask = SwizzleMask::parse("xyz").unwrap();
        main_with(
            &mut unit,
            vec![Statement::assign(
                Deref::Var(o),
                Rvalue::swizzle(Rvalue::var(u), mask),
            )],
        );

        assert_eq!(
            TreeEmitter::new().emit(&unit),
            "(\n\
             (declare (uniform) vec4 u)\n\
             (function main\n  \
               (signature void\n    \
                 (parameters\n    \
                 )\n    \
                 (\n      \
                   (assign (xyz) (var_ref o) (swiz xyz (var_ref u)))\n    \
                 ))\n\
             )\n\
             )\n"
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            constant_text(&Constant::float(0.5)),
            "(constant float (0.500000))"
        );
        assert_eq!(constant_text(&Constant::bool(true)), "(constant bool (1))");
        assert_eq!(
            constant_text(&Constant::float(9.5367431640625e-7)),
            "(constant float (9.5367431640625e-7))"
        );
        let a = Constant {
            ty: Type::array(Type::INT, 2),
            data: ConstantData::Array(vec![Constant::int(1), Constant::int(-2)]),
        };
        assert_eq!(
            constant_text(&a),
            "(constant (array int 2) ((constant int (1)) (constant int (-2))))"
        );
    }

    #[test]
    fn test_statements_printed_literally() {
        let mut unit = Unit::new();
        let i = unit.add_var(Variable::new(Some("i".to_string()), Type::INT, StorageMode::Auto));
        let lp = unit.new_loop(vec![
            Statement::If(If {
                condition: Rvalue::binop(
                    glopt_ir::ExprOp::Gequal,
                    Type::BOOL,
                    Rvalue::var(i),
                    Rvalue::constant(Constant::int(3)),
                ),
                then_body: vec![Statement::LoopJump(LoopJump::Break)],
                else_body: Vec::new(),
            }),
            Statement::Discard(None),
        ]);
        // A global statement stays at top level.
        unit.items.push(Statement::assign(
            Deref::Var(i),
            Rvalue::constant(Constant::int(0)),
        ));
        main_with(&mut unit, vec![Statement::Loop(lp), Statement::Return(None)]);

        let text = TreeEmitter::new().emit(&unit);
        assert!(text.starts_with("(\n(assign (x) (var_ref i) (constant int (0)))\n"), "{}", text);
        assert!(
            text.contains(
                "      (loop (\n        (if (expression bool gequal (var_ref i) (constant int (3))) (\n          break\n        )\n        (\n        ))\n        (discard)\n      ))\n      (return)\n"
            ),
            "{}",
            text
        );
    }

    #[test]
    fn test_structures_and_records() {
        let mut unit = Unit::new();
        let s = StructType {
            name: "Light".to_string(),
            fields: vec![
                StructField {
                    name: "color".to_string(),
                    ty: Type::Vector(BaseType::Float, 3),
                },
                StructField {
                    name: "weights".to_string(),
                    ty: Type::array(Type::FLOAT, 2),
                },
            ],
        };
        unit.structs.push(s.clone());
        let l = unit.add_var(Variable::new(
            Some("light".to_string()),
            Type::Struct(s),
            StorageMode::Uniform,
        ));
        let x = unit.add_var(Variable::new(Some("x".to_string()), Type::FLOAT, StorageMode::Auto));
        main_with(
            &mut unit,
            vec![Statement::assign(
                Deref::Var(x),
                Rvalue::Deref(Deref::array(
                    Rvalue::Deref(Deref::record(Rvalue::var(l), 1)),
                    Rvalue::constant(Constant::int(0)),
                )),
            )],
        );

        let text = TreeEmitter::new().emit(&unit);
        assert!(
            text.starts_with(
                "(structure (Light) (2)\n  ((vec3) (color))\n  (((array float 2)) (weights))\n)\n(\n"
            ),
            "{}",
            text
        );
        assert!(
            text.contains("(array_ref (record_ref (var_ref light) weights) (constant int (0)))"),
            "{}",
            text
        );
    }

    #[test]
    fn test_tree_names_use_at_suffix() {
        let mut unit = Unit::new();
        let a = unit.add_var(Variable::new(Some("t".to_string()), Type::INT, StorageMode::Auto));
        let b = unit.add_var(Variable::new(Some("t".to_string()), Type::INT, StorageMode::Auto));
        unit.items.push(Statement::Declare(a));
        unit.items.push(Statement::Declare(b));
        let text = TreeEmitter::new().emit(&unit);
        assert_eq!(text, "(\n(declare () int t)\n(declare () int t@1)\n)\n");
    }
}
