//! Expressions, swizzles and dereferences.

use glopt_ir::{Deref, ExprOp, Expression, Rvalue, Swizzle, Type};

use super::Printer;

/// Expression nesting between forced line breaks.
const BREAK_DEPTH: u32 = 8;

impl Printer<'_> {
    pub(super) fn rvalue(&mut self, rv: &Rvalue) {
        match rv {
            Rvalue::Expression(e) => self.expression(e),
            Rvalue::Texture(t) => self.texture(t),
            Rvalue::Swizzle(s) => self.swizzle(s),
            Rvalue::Deref(d) => self.deref(d),
            Rvalue::Constant(c) => self.constant(c),
        }
    }

    pub(super) fn deref(&mut self, d: &Deref) {
        let unit = self.unit;
        match d {
            Deref::Var(id) => {
                let name = self.ctx.name(*id, &unit.vars);
                self.push(&name);
            }
            Deref::Array { array, index } => {
                self.rvalue(array);
                self.push("[");
                self.rvalue(index);
                self.push("]");
            }
            Deref::Record { record, field } => {
                self.rvalue(record);
                match record.ty(&unit.vars) {
                    Type::Struct(s) if *field < s.fields.len() => {
                        self.push(".");
                        self.push(&s.fields[*field].name);
                    }
                    _ => self.unprintable("field of a non-structure value"),
                }
            }
        }
    }

    fn swizzle(&mut self, s: &Swizzle) {
        let val_ty = s.val.ty(&self.unit.vars);
        if val_ty.is_scalar() {
            // Scalars cannot be swizzled; widen with a constructor instead.
            if s.mask.count == 1 {
                self.rvalue(&s.val);
            } else {
                let ty = val_ty.with_components(s.mask.count).unwrap_or(val_ty);
                self.push(&ty.name());
                self.push("(");
                self.rvalue(&s.val);
                self.push(")");
            }
            return;
        }
        self.rvalue(&s.val);
        if val_ty.vector_elements() > 1 {
            self.push(".");
            self.push(&s.mask.letters());
        }
    }

    fn expression(&mut self, e: &Expression) {
        self.expr_depth += 1;
        self.break_open();
        match e.operands.len() {
            1 => self.unary(e),
            2 => self.binary(e),
            _ => self.nary(e),
        }
        self.break_close();
        self.expr_depth -= 1;
    }

    fn break_open(&mut self) {
        if self.expr_depth % BREAK_DEPTH == 0 {
            self.indent += 1;
            self.push("\n");
            self.line_start();
        }
    }

    fn break_close(&mut self) {
        if self.expr_depth % BREAK_DEPTH == 0 {
            self.indent -= 1;
            self.push("\n");
            self.line_start();
        }
    }

    fn unary(&mut self, e: &Expression) {
        let operand = &e.operands[0];
        match e.op {
            ExprOp::Rcp => {
                self.push("(1.0/(");
                self.rvalue(operand);
                self.push("))");
            }
            ExprOp::Saturate => {
                let one = if e.ty.base_type() == Some(glopt_ir::BaseType::Double) {
                    "0.0lf, 1.0lf"
                } else {
                    "0.0, 1.0"
                };
                self.push("clamp(");
                self.rvalue(operand);
                self.push(", ");
                self.push(one);
                self.push(")");
            }
            op if is_type_conversion(op) => {
                self.push(&e.ty.name());
                self.push("(");
                self.rvalue(operand);
                self.push(")");
            }
            op => {
                self.push(&operator_name(op));
                self.push("(");
                self.rvalue(operand);
                self.push(")");
            }
        }
    }

    fn binary(&mut self, e: &Expression) {
        let (a, b) = (&e.operands[0], &e.operands[1]);
        let vector_compare = e.ty.is_vector() && e.op.is_comparison();
        match e.op {
            ExprOp::VectorExtract => {
                self.rvalue(a);
                self.push("[");
                self.rvalue(b);
                self.push("]");
            }
            ExprOp::Mod => {
                let ty = e.ty.name();
                self.push("(");
                self.push(&ty);
                self.push("(mod(");
                self.rvalue(a);
                self.push(", ");
                self.rvalue(b);
                self.push(")))");
            }
            _ if vector_compare => self.call_like(vector_comparison_name(e.op), &e.operands),
            ExprOp::AllEqual => self.infix(a, "==", b),
            ExprOp::AnyNequal => self.infix(a, "!=", b),
            op if is_function_like(op) => self.call_like(op.glsl_name(), &e.operands),
            op if op.glsl_name().ends_with("_TODO") => {
                self.call_like(&operator_name(op), &e.operands)
            }
            op => self.infix(a, op.glsl_name(), b),
        }
    }

    fn nary(&mut self, e: &Expression) {
        match e.op {
            ExprOp::Csel if e.operands.len() == 3 => {
                // mix() picks its second argument where the selector is true.
                let n = e.operands[1].ty(&self.unit.vars).vector_elements();
                self.push("mix(");
                self.rvalue(&e.operands[2]);
                self.push(", ");
                self.rvalue(&e.operands[1]);
                self.push(", ");
                self.push(&Type::vector(glopt_ir::BaseType::Bool, n).name());
                self.push("(");
                self.rvalue(&e.operands[0]);
                self.push("))");
            }
            ExprOp::Vector => {
                let n = (e.ty.components() as usize).min(e.operands.len());
                self.call_like(&e.ty.name(), &e.operands[..n]);
            }
            op => self.call_like(&operator_name(op), &e.operands),
        }
    }

    fn infix(&mut self, a: &Rvalue, op: &str, b: &Rvalue) {
        self.push("(");
        self.rvalue(a);
        self.push(" ");
        self.push(op);
        self.push(" ");
        self.rvalue(b);
        self.push(")");
    }

    fn call_like(&mut self, name: &str, args: &[Rvalue]) {
        self.push(name);
        self.push("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.rvalue(arg);
        }
        self.push(")");
    }

    /// Condition of a loop that exits when `cond` holds, printed as the
    /// condition under which it keeps running.
    pub(super) fn negated_condition(&mut self, cond: &Rvalue) {
        if let Some(e) = cond.as_expression() {
            if e.operands.len() == 2 && !e.ty.is_vector() {
                if let Some(inverse) = e.op.inverse_comparison() {
                    self.bare_comparison(inverse, &e.operands[0], &e.operands[1]);
                    return;
                }
            }
            if e.op == ExprOp::LogicNot {
                let inner = &e.operands[0];
                match inner.as_expression() {
                    Some(c) if c.operands.len() == 2 && !c.ty.is_vector() && is_infix_comparison(c.op) => {
                        self.bare_comparison(c.op, &c.operands[0], &c.operands[1]);
                    }
                    _ => self.rvalue(inner),
                }
                return;
            }
        }
        self.push("!(");
        self.rvalue(cond);
        self.push(")");
    }

    fn bare_comparison(&mut self, op: ExprOp, a: &Rvalue, b: &Rvalue) {
        let symbol = match op {
            ExprOp::AllEqual => "==",
            ExprOp::AnyNequal => "!=",
            other => other.glsl_name(),
        };
        self.rvalue(a);
        self.push(" ");
        self.push(symbol);
        self.push(" ");
        self.rvalue(b);
    }
}

/// Spelling of an operator, warning when it has no source equivalent.
fn operator_name(op: ExprOp) -> alloc::string::String {
    let name = op.glsl_name();
    if name.ends_with("_TODO") {
        log::warn!("operator {} has no source spelling", op.tree_name());
    }
    alloc::string::String::from(name)
}

fn is_type_conversion(op: ExprOp) -> bool {
    use ExprOp::*;
    op.is_conversion() || matches!(op, D2f | F2d | D2i | I2d | D2u | U2d | D2b)
}

/// Binary operators printed as a builtin call rather than infix.
fn is_function_like(op: ExprOp) -> bool {
    use ExprOp::*;
    matches!(op, Dot | Min | Max | Pow | Atan2)
}

fn is_infix_comparison(op: ExprOp) -> bool {
    op.is_comparison() || matches!(op, ExprOp::AllEqual | ExprOp::AnyNequal)
}

/// Component-wise comparison builtins.
fn vector_comparison_name(op: ExprOp) -> &'static str {
    match op {
        ExprOp::Less => "lessThan",
        ExprOp::Gequal => "greaterThanEqual",
        ExprOp::Equal => "equal",
        _ => "notEqual",
    }
}
