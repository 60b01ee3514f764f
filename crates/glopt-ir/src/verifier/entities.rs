//! Entity existence validation.
//!
//! Validates that all referenced variables and called functions exist.

use alloc::{collections::BTreeSet, format, string::ToString, vec::Vec};

use super::function_location;
use crate::{
    visit::{statement_rvalues, walk_rvalue, walk_statements},
    Deref, Rvalue, Statement, Unit, VerifierError,
};

/// Verify that all referenced entities exist
///
/// Checks:
/// - Every declared, read or written variable is in the variable table
/// - Every function parameter is in the variable table
/// - Every non-builtin call names a function of the unit
pub fn verify_entities(unit: &Unit, errors: &mut Vec<VerifierError>) {
    let functions: BTreeSet<&str> = unit.functions().map(|f| f.name.as_str()).collect();

    for item in &unit.items {
        match item {
            Statement::Function(f) => {
                let loc = function_location(Some(&f.name));
                for sig in &f.signatures {
                    for p in &sig.params {
                        if !unit.vars.contains(*p) {
                            errors.push(VerifierError::with_location(
                                format!("Parameter {} is not a known variable", p),
                                loc.to_string(),
                            ));
                        }
                    }
                    verify_list(unit, &functions, &sig.body, &loc, errors);
                }
            }
            other => verify_list(
                unit,
                &functions,
                core::slice::from_ref(other),
                &function_location(None),
                errors,
            ),
        }
    }
}

fn verify_list(
    unit: &Unit,
    functions: &BTreeSet<&str>,
    stmts: &[Statement],
    loc: &str,
    errors: &mut Vec<VerifierError>,
) {
    walk_statements(stmts, &mut |stmt| {
        let check_var = |v: crate::VarId, errors: &mut Vec<VerifierError>| {
            if !unit.vars.contains(v) {
                errors.push(VerifierError::with_location(
                    format!("Reference to unknown variable {}", v),
                    loc.to_string(),
                ));
            }
        };
        match stmt {
            Statement::Declare(v) => check_var(*v, errors),
            Statement::Assign(a) => {
                if let Deref::Var(v) = &a.lhs {
                    check_var(*v, errors);
                }
            }
            Statement::Call(c) => {
                if let Some(Deref::Var(v)) = &c.return_deref {
                    check_var(*v, errors);
                }
                if !c.builtin && !functions.contains(c.callee.as_str()) {
                    errors.push(VerifierError::with_location(
                        format!("Call to undefined function '{}'", c.callee),
                        loc.to_string(),
                    ));
                }
            }
            _ => {}
        }
        for rv in statement_rvalues(stmt) {
            walk_rvalue(rv, &mut |node| match node {
                Rvalue::Deref(Deref::Var(v)) => check_var(*v, errors),
                Rvalue::Texture(t) => {
                    if let Deref::Var(v) = &t.sampler {
                        check_var(*v, errors);
                    }
                }
                _ => {}
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;
    use crate::{Call, Function, Signature, Type};

    #[test]
    fn test_unknown_callee() {
        let mut unit = Unit::new();
        let mut main = Function::new("main".to_string());
        let mut sig = Signature::new(Type::Void, Vec::new());
        sig.is_defined = true;
        sig.body = vec![
            Statement::Call(Call {
                callee: "helper".to_string(),
                return_deref: None,
                args: Vec::new(),
                builtin: false,
            }),
            Statement::Call(Call {
                callee: "memoryBarrier".to_string(),
                return_deref: None,
                args: Vec::new(),
                builtin: true,
            }),
        ];
        main.signatures.push(sig);
        unit.items.push(Statement::Function(main));

        let mut errors = Vec::new();
        verify_entities(&unit, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("helper"));
    }
}
