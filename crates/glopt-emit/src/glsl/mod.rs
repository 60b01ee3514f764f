//! Source emitter.
//!
//! Walks the unit once, printing top-level items in order. Statements met at
//! global scope that the language only allows inside functions (initializer
//! assignments and calls) are queued on the [`PrintContext`] and replayed at
//! the start of the entry function.

mod assign;
mod constant;
mod decl;
mod expr;
mod loops;
mod texture;

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{
    Call, Function, If, LoopAnalysis, LoopJump, Rvalue, Signature, Statement, Target, Unit,
};

use crate::{context::PrintContext, names::NameStyle};

/// Prints a unit as shading-language source for a target.
#[derive(Debug, Clone)]
pub struct GlslEmitter<'a> {
    target: &'a Target,
    entry: String,
}

impl<'a> GlslEmitter<'a> {
    pub fn new(target: &'a Target) -> Self {
        Self {
            target,
            entry: String::from("main"),
        }
    }

    /// Use `entry` instead of `main` as the function receiving hoisted
    /// global statements.
    pub fn with_entry(mut self, entry: &str) -> Self {
        self.entry = String::from(entry);
        self
    }

    /// Generate source for `unit`.
    ///
    /// Loop analysis is recomputed and a fresh print context is created for
    /// every call.
    pub fn emit(&self, unit: &Unit) -> String {
        let loops = LoopAnalysis::analyze(unit);
        let mut printer = Printer {
            unit,
            target: self.target,
            entry: &self.entry,
            loops: &loops,
            ctx: PrintContext::new(NameStyle::Source),
            out: String::new(),
            indent: 0,
            expr_depth: 0,
        };
        printer.unit_text();
        log::debug!("emitted {} bytes of source", printer.out.len());
        printer.out
    }
}

/// Recursive printing state of one emission.
struct Printer<'a> {
    unit: &'a Unit,
    target: &'a Target,
    entry: &'a str,
    loops: &'a LoopAnalysis,
    ctx: PrintContext,
    out: String,
    indent: usize,
    /// Nesting of expressions, for breaking long chains
    expr_depth: u32,
}

impl<'a> Printer<'a> {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    /// Placeholder for a construct with no source form.
    fn unprintable(&mut self, what: &str) {
        log::warn!("no source form for {}, printing placeholder", what);
        self.push("error");
    }

    fn unit_text(&mut self) {
        self.header();
        let unit = self.unit;
        for s in &unit.structs {
            self.struct_decl(s);
        }
        for item in &unit.items {
            match item {
                Statement::Function(f) => self.function(f),
                Statement::Declare(v) => {
                    let Some(var) = unit.vars.get(*v) else {
                        continue;
                    };
                    if var.is_builtin() && !var.decorations.invariant {
                        continue;
                    }
                    self.declaration(*v);
                    self.push(";\n");
                }
                Statement::Assign(_) | Statement::Call(_) => {
                    if !self.ctx.defer(item.clone()) {
                        log::warn!(
                            "global statement after {}() cannot be hoisted, dropped",
                            self.entry
                        );
                    }
                    self.push("//;\n");
                }
                other => {
                    self.simple_statement(other);
                    self.push(";\n");
                }
            }
        }
    }

    fn function(&mut self, f: &Function) {
        if f.signatures.iter().all(|s| s.is_builtin) {
            return;
        }
        for sig in f.signatures.iter().filter(|s| !s.is_builtin) {
            self.signature(&f.name, sig);
        }
    }

    fn signature(&mut self, name: &str, sig: &Signature) {
        self.ctx.push_scope();
        let ret = sig.return_type.to_string();
        self.push(&ret);
        self.push(" ");
        self.push(name);
        self.push("(");
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.declaration(*p);
        }
        if !sig.is_defined {
            self.push(");\n");
            self.ctx.pop_scope();
            return;
        }
        self.push(")\n{\n");
        self.indent += 1;
        if name == self.entry && sig.params.is_empty() {
            let pending: Vec<Statement> = self.ctx.take_pending();
            for stmt in &pending {
                self.statement(stmt);
            }
        }
        self.statements(&sig.body, &[]);
        self.indent -= 1;
        self.push("}\n");
        self.ctx.pop_scope();
    }

    /// Print a statement list, leaving out positions in `skip` and the
    /// statements folded into canonical loop headers.
    fn statements(&mut self, list: &[Statement], skip: &[usize]) {
        let hoisted = self.hoisted_into_loops(list);
        for (i, stmt) in list.iter().enumerate() {
            if skip.contains(&i) || hoisted.contains(&i) {
                continue;
            }
            self.statement(stmt);
        }
    }

    fn statement(&mut self, stmt: &Statement) {
        self.line_start();
        match stmt {
            Statement::If(i) => self.if_stmt(i),
            Statement::Loop(l) => self.loop_stmt(l),
            Statement::Function(f) => self.function(f),
            other => {
                self.simple_statement(other);
                self.push(";\n");
            }
        }
    }

    /// Statements printed on one line without the terminator.
    fn simple_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Declare(v) => self.declaration(*v),
            Statement::Assign(a) => self.assignment(a),
            Statement::Call(c) => self.call(c),
            Statement::LoopJump(LoopJump::Break) => self.push("break"),
            Statement::LoopJump(LoopJump::Continue) => self.push("continue"),
            Statement::Return(value) => {
                self.push("return");
                if let Some(v) = value {
                    self.push(" ");
                    self.rvalue(v);
                }
            }
            Statement::Discard(None) => self.push("discard"),
            Statement::Discard(Some(cond)) => {
                self.push("if (");
                self.rvalue(cond);
                self.push(") discard");
            }
            Statement::EmitVertex(stream) => {
                self.stream_builtin("EmitVertex", "EmitStreamVertex", stream)
            }
            Statement::EndPrimitive(stream) => {
                self.stream_builtin("EndPrimitive", "EndStreamPrimitive", stream)
            }
            Statement::Barrier => self.push("barrier()"),
            Statement::If(_) | Statement::Loop(_) | Statement::Function(_) => {
                self.unprintable("nested block in expression position")
            }
        }
    }

    fn stream_builtin(&mut self, plain: &str, with_stream: &str, stream: &Rvalue) {
        let default_stream = stream.as_constant().map_or(false, |c| c.is_zero());
        if default_stream {
            self.push(plain);
            self.push("()");
        } else {
            self.push(with_stream);
            self.push("(");
            self.rvalue(stream);
            self.push(")");
        }
    }

    fn call(&mut self, c: &Call) {
        if let Some(ret) = &c.return_deref {
            self.deref(ret);
            self.push(" = ");
        }
        self.push(&c.callee);
        self.push("(");
        for (i, arg) in c.args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.rvalue(arg);
        }
        self.push(")");
    }

    fn if_stmt(&mut self, i: &If) {
        self.push("if (");
        self.rvalue(&i.condition);
        self.push(")\n");
        self.block(&i.then_body);
        if !i.else_body.is_empty() {
            self.line_start();
            self.push("else\n");
            self.block(&i.else_body);
        }
    }

    /// `{ ... }` on their own lines at the current indentation.
    fn block(&mut self, body: &[Statement]) {
        self.block_except(body, &[]);
    }

    fn block_except(&mut self, body: &[Statement], skip: &[usize]) {
        self.line_start();
        self.push("{\n");
        self.indent += 1;
        self.statements(body, skip);
        self.indent -= 1;
        self.line_start();
        self.push("}\n");
    }
}

#[cfg(test)]
mod tests;
