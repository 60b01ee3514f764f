//! Jump cleanup and lowering.

use alloc::vec::Vec;

use glopt_ir::{visit, LoopJump, Statement, Unit};

use crate::{
    options::LowerJumpsOptions,
    pass::{Pass, PassContext},
    pass_id::{PassArgs, PassId},
};

/// Drops code after unconditional jumps, then applies the rewrites enabled
/// in [`LowerJumpsOptions`].
#[derive(Debug)]
pub struct LowerJumps;

impl Pass for LowerJumps {
    fn id(&self) -> PassId {
        PassId::LowerJumps
    }

    fn run(&self, unit: &mut Unit, ctx: &PassContext<'_>) -> bool {
        let opts = match ctx.args {
            PassArgs::LowerJumps(opts) => *opts,
            _ => ctx.options.lower_jumps,
        };
        let entry = ctx.options.dead_functions.entry_function.as_str();

        let mut changed = false;
        for item in unit.items.iter_mut() {
            let Statement::Function(f) = item else {
                continue;
            };
            let is_main = f.name == entry;
            for sig in f.signatures.iter_mut() {
                changed |= visit::rewrite_statement_lists(&mut sig.body, &mut |list| {
                    lower_list(list, &opts)
                });
                let lower_return = if is_main {
                    opts.lower_main_return
                } else {
                    opts.lower_sub_return
                };
                if lower_return && sig.return_type.is_void() {
                    changed |= strip_trailing(&mut sig.body, &Statement::Return(None), true);
                }
            }
        }
        changed
    }
}

fn lower_list(list: &mut Vec<Statement>, opts: &LowerJumpsOptions) -> bool {
    let mut changed = truncate_after_jump(list);
    if opts.pull_out_jumps {
        let mut i = 0;
        while i < list.len() {
            if pull_out(list, i) {
                changed = true;
                truncate_after_jump(list);
            }
            i += 1;
        }
    }
    let mut i = 0;
    while i < list.len() {
        if let Statement::Loop(l) = &mut list[i] {
            if opts.lower_continue {
                changed |= strip_trailing(
                    &mut l.body,
                    &Statement::LoopJump(LoopJump::Continue),
                    true,
                );
            }
        }
        let once = matches!(&list[i], Statement::Loop(l) if runs_once(&l.body));
        if opts.lower_break && once {
            if let Statement::Loop(mut l) = list.remove(i) {
                l.body.pop();
                let n = l.body.len();
                list.splice(i..i, l.body);
                changed = true;
                i += n;
                continue;
            }
        }
        i += 1;
    }
    changed
}

/// Drop statements after the first unconditional jump.
pub(crate) fn truncate_after_jump(list: &mut Vec<Statement>) -> bool {
    match list.iter().position(Statement::is_jump) {
        Some(pos) if pos + 1 < list.len() => {
            list.truncate(pos + 1);
            true
        }
        _ => false,
    }
}

/// Remove `jump` when it ends `list`. With `through_ifs`, also remove it
/// from the ends of both branches of a trailing `if`.
pub(crate) fn strip_trailing(list: &mut Vec<Statement>, jump: &Statement, through_ifs: bool) -> bool {
    match list.last_mut() {
        Some(last) if last == jump => {
            list.pop();
            true
        }
        Some(Statement::If(i)) if through_ifs => {
            let a = strip_trailing(&mut i.then_body, jump, true);
            let b = strip_trailing(&mut i.else_body, jump, true);
            a | b
        }
        _ => false,
    }
}

/// When both branches of the `if` at `pos` end in the same jump, move it
/// after the `if`.
fn pull_out(list: &mut Vec<Statement>, pos: usize) -> bool {
    let Statement::If(i) = &mut list[pos] else {
        return false;
    };
    let shared = match (i.then_body.last(), i.else_body.last()) {
        (Some(a), Some(b)) if a.is_jump() && a == b => a.clone(),
        _ => return false,
    };
    i.then_body.pop();
    i.else_body.pop();
    list.insert(pos + 1, shared);
    true
}

/// The body ends in `break` and nothing else leaves or restarts the loop.
fn runs_once(body: &[Statement]) -> bool {
    match body.split_last() {
        Some((Statement::LoopJump(LoopJump::Break), rest)) => !visit::contains_loop_jump(rest),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use glopt_ir::{Constant, If, Rvalue, Type};

    use super::*;
    use crate::passes::test_util::*;

    fn cond() -> Rvalue {
        Rvalue::constant(Constant::bool(true))
    }

    #[test]
    fn test_unreachable_after_return_removed() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        push_function(
            &mut unit,
            "main",
            vec![
                assign(x, float(1.0)),
                Statement::Return(None),
                assign(x, float(2.0)),
            ],
        );
        assert!(run(&LowerJumps, &mut unit));
        assert_eq!(main_body(&unit), &vec![assign(x, float(1.0))]);
        assert!(!run(&LowerJumps, &mut unit));
    }

    #[test]
    fn test_shared_jump_pulled_out() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let body = vec![Statement::If(If {
            condition: cond(),
            then_body: vec![assign(x, float(1.0)), Statement::LoopJump(LoopJump::Break)],
            else_body: vec![Statement::LoopJump(LoopJump::Break)],
        })];
        let l = unit.new_loop(body);
        let id = l.id;
        push_function(&mut unit, "main", vec![Statement::Loop(l)]);
        let args = PassArgs::LowerJumps(LowerJumpsOptions {
            lower_break: false,
            ..LowerJumpsOptions::default()
        });
        assert!(run_with(&LowerJumps, &mut unit, args));
        let Statement::Loop(l) = &main_body(&unit)[0] else {
            panic!("loop expected");
        };
        assert_eq!(l.id, id);
        assert_eq!(l.body.len(), 2);
        assert_eq!(l.body[1], Statement::LoopJump(LoopJump::Break));
    }

    #[test]
    fn test_loop_ending_in_break_is_inlined() {
        let mut unit = Unit::new();
        let x = local(&mut unit, "x", Type::FLOAT);
        let l = unit.new_loop(vec![
            assign(x, float(1.0)),
            Statement::LoopJump(LoopJump::Break),
        ]);
        push_function(&mut unit, "main", vec![Statement::Loop(l)]);
        assert!(run(&LowerJumps, &mut unit));
        assert_eq!(main_body(&unit), &vec![assign(x, float(1.0))]);
    }

    #[test]
    fn test_trailing_return_respects_main_flag() {
        let mut unit = Unit::new();
        push_function(&mut unit, "main", vec![Statement::Return(None)]);
        let keep = PassArgs::LowerJumps(LowerJumpsOptions {
            lower_main_return: false,
            ..LowerJumpsOptions::default()
        });
        assert!(!run_with(&LowerJumps, &mut unit, keep));
        assert!(run(&LowerJumps, &mut unit));
        assert!(main_body(&unit).is_empty());
    }
}
