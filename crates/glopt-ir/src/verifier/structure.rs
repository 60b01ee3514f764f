//! Tree shape validation.

use alloc::{collections::BTreeSet, format, string::ToString, vec::Vec};

use super::function_location;
use crate::{LoopId, Statement, Unit, VerifierError};

/// Verify the nesting structure of the unit
///
/// Checks:
/// - Function definitions appear only at the top level
/// - `break`/`continue` appear only inside a loop
/// - `return` and `discard` appear only inside a function
/// - Loop identities are unique
pub fn verify_structure(unit: &Unit, errors: &mut Vec<VerifierError>) {
    let mut loops = BTreeSet::new();
    for item in &unit.items {
        match item {
            Statement::Function(f) => {
                let loc = function_location(Some(&f.name));
                for sig in &f.signatures {
                    check_list(&sig.body, true, 0, &loc, &mut loops, errors);
                }
            }
            other => check_list(
                core::slice::from_ref(other),
                false,
                0,
                &function_location(None),
                &mut loops,
                errors,
            ),
        }
    }
}

fn check_list(
    stmts: &[Statement],
    in_function: bool,
    loop_depth: u32,
    loc: &str,
    loops: &mut BTreeSet<LoopId>,
    errors: &mut Vec<VerifierError>,
) {
    for stmt in stmts {
        match stmt {
            Statement::Function(f) => errors.push(VerifierError::with_location(
                format!("Function '{}' defined inside a statement list", f.name),
                loc.to_string(),
            )),
            Statement::LoopJump(_) if loop_depth == 0 => {
                errors.push(VerifierError::with_location(
                    "Loop jump outside of a loop".to_string(),
                    loc.to_string(),
                ))
            }
            Statement::Return(_) | Statement::Discard(_) if !in_function => {
                errors.push(VerifierError::with_location(
                    "Return or discard outside of a function".to_string(),
                    loc.to_string(),
                ))
            }
            Statement::If(i) => {
                check_list(&i.then_body, in_function, loop_depth, loc, loops, errors);
                check_list(&i.else_body, in_function, loop_depth, loc, loops, errors);
            }
            Statement::Loop(l) => {
                if !loops.insert(l.id) {
                    errors.push(VerifierError::with_location(
                        format!("Duplicate loop identity {}", l.id),
                        loc.to_string(),
                    ));
                }
                check_list(&l.body, in_function, loop_depth + 1, loc, loops, errors);
            }
            _ => {}
        }
    }
}
