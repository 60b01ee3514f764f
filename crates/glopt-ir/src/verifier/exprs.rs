//! Expression and assignment shape validation.

use alloc::{format, string::ToString, vec::Vec};

use super::function_location;
use crate::{
    stmt::full_mask,
    visit::{statement_rvalues, walk_rvalue, walk_statements},
    Deref, Rvalue, Statement, Type, Unit, VerifierError,
};

/// Verify expression operand counts and assignment targets
///
/// Checks:
/// - Every expression has as many operands as its operator takes
/// - Swizzles select existing components
/// - Record dereferences name an existing field
/// - Assignment destinations are rooted at a variable
/// - Write masks only name components of the destination
/// - Branch conditions are scalar booleans
pub fn verify_exprs(unit: &Unit, errors: &mut Vec<VerifierError>) {
    for item in &unit.items {
        match item {
            Statement::Function(f) => {
                let loc = function_location(Some(&f.name));
                for sig in &f.signatures {
                    check_list(unit, &sig.body, &loc, errors);
                }
            }
            other => check_list(
                unit,
                core::slice::from_ref(other),
                &function_location(None),
                errors,
            ),
        }
    }
}

fn check_list(unit: &Unit, stmts: &[Statement], loc: &str, errors: &mut Vec<VerifierError>) {
    let vars = &unit.vars;
    walk_statements(stmts, &mut |stmt| {
        match stmt {
            Statement::Assign(a) => {
                if a.lhs.root_var().is_none() {
                    errors.push(VerifierError::with_location(
                        "Assignment destination is not rooted at a variable".to_string(),
                        loc.to_string(),
                    ));
                }
                let lhs_ty = a.lhs.ty(vars);
                let full = full_mask(&lhs_ty);
                if a.write_mask != 0 && full != 0 && a.write_mask & !full != 0 {
                    errors.push(VerifierError::with_location(
                        format!(
                            "Write mask {:#06b} exceeds the components of {}",
                            a.write_mask, lhs_ty
                        ),
                        loc.to_string(),
                    ));
                }
                if let Some(c) = &a.condition {
                    check_condition(c, vars, loc, errors);
                }
            }
            Statement::If(i) => check_condition(&i.condition, vars, loc, errors),
            _ => {}
        }
        for rv in statement_rvalues(stmt) {
            walk_rvalue(rv, &mut |node| check_node(node, unit, loc, errors));
        }
    });
}

fn check_condition(
    cond: &Rvalue,
    vars: &crate::VarTable,
    loc: &str,
    errors: &mut Vec<VerifierError>,
) {
    let ty = cond.ty(vars);
    if ty != Type::BOOL {
        errors.push(VerifierError::with_location(
            format!("Condition has type {}, expected bool", ty),
            loc.to_string(),
        ));
    }
}

fn check_node(node: &Rvalue, unit: &Unit, loc: &str, errors: &mut Vec<VerifierError>) {
    match node {
        Rvalue::Expression(e) => {
            if e.operands.len() != e.op.arity() {
                errors.push(VerifierError::with_location(
                    format!(
                        "Expression {} takes {} operands, got {}",
                        e.op.tree_name(),
                        e.op.arity(),
                        e.operands.len()
                    ),
                    loc.to_string(),
                ));
            }
        }
        Rvalue::Swizzle(s) => {
            let src = s.val.ty(&unit.vars);
            let available = src.vector_elements();
            if src.is_numeric() && !src.is_matrix() && s.mask.iter().any(|c| c >= available) {
                errors.push(VerifierError::with_location(
                    format!("Swizzle .{} out of range for {}", s.mask.letters(), src),
                    loc.to_string(),
                ));
            }
        }
        Rvalue::Deref(Deref::Record { record, field }) => match record.ty(&unit.vars) {
            Type::Struct(st) if *field < st.fields.len() => {}
            Type::Void => {}
            other => errors.push(VerifierError::with_location(
                format!("Field {} does not exist in {}", field, other),
                loc.to_string(),
            )),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;
    use crate::{
        Assignment, BaseType, Constant, ExprOp, Function, If, Signature, StorageMode, Variable,
    };

    fn unit_with(body: impl FnOnce(&mut Unit) -> Vec<Statement>) -> Unit {
        let mut unit = Unit::new();
        let stmts = body(&mut unit);
        let mut main = Function::new("main".to_string());
        let mut sig = Signature::new(Type::Void, Vec::new());
        sig.is_defined = true;
        sig.body = stmts;
        main.signatures.push(sig);
        unit.items.push(Statement::Function(main));
        unit
    }

    #[test]
    fn test_operand_count_mismatch() {
        let unit = unit_with(|_| {
            vec![Statement::Return(Some(Rvalue::expr(
                ExprOp::Add,
                Type::FLOAT,
                vec![Rvalue::constant(Constant::float(1.0))],
            )))]
        });
        let mut errors = Vec::new();
        verify_exprs(&unit, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("add"));
    }

    #[test]
    fn test_write_mask_out_of_range() {
        let unit = unit_with(|u| {
            let v = u.add_var(Variable::new(
                Some("v".to_string()),
                Type::Vector(BaseType::Float, 2),
                StorageMode::Auto,
            ));
            vec![Statement::Assign(Assignment::masked(
                Deref::Var(v),
                Rvalue::constant(Constant::float(1.0)),
                0b0100,
            ))]
        });
        let mut errors = Vec::new();
        verify_exprs(&unit, &mut errors);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_bool_condition() {
        let unit = unit_with(|_| {
            vec![Statement::If(If {
                condition: Rvalue::constant(Constant::int(1)),
                then_body: Vec::new(),
                else_body: Vec::new(),
            })]
        });
        let mut errors = Vec::new();
        verify_exprs(&unit, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("int"));
    }

    #[test]
    fn test_lhs_must_be_rooted() {
        let unit = unit_with(|_| {
            vec![Statement::assign(
                Deref::array(
                    Rvalue::constant(Constant::float(1.0)),
                    Rvalue::constant(Constant::int(0)),
                ),
                Rvalue::constant(Constant::float(1.0)),
            )]
        });
        let mut errors = Vec::new();
        verify_exprs(&unit, &mut errors);
        assert_eq!(errors.len(), 1);
    }
}
