//! Projective texturing lowering.

use glopt_ir::{visit, ExprOp, Rvalue, Unit, VarTable};

use crate::{
    pass::{Pass, PassContext},
    pass_id::PassId,
};

/// Divides the coordinate (and shadow comparator) of a projective lookup
/// by its projector, leaving a plain lookup.
#[derive(Debug)]
pub struct LowerTextureProjection;

impl Pass for LowerTextureProjection {
    fn id(&self) -> PassId {
        PassId::LowerTextureProjection
    }

    fn run(&self, unit: &mut Unit, _ctx: &PassContext<'_>) -> bool {
        let vars = &unit.vars;
        visit::rewrite_all_rvalues(&mut unit.items, &mut |rv| {
            let Rvalue::Texture(t) = rv else {
                return false;
            };
            if !t.op.takes_projector() {
                return false;
            }
            let Some(projector) = t.projector.take() else {
                return false;
            };
            let rcp = Rvalue::unop(ExprOp::Rcp, projector.ty(vars), projector);
            if let Some(coord) = t.coordinate.take() {
                t.coordinate = Some(scale(coord, &rcp, vars));
            }
            if let Some(cmp) = t.shadow_comparator.take() {
                t.shadow_comparator = Some(scale(cmp, &rcp, vars));
            }
            true
        })
    }
}

fn scale(value: Rvalue, rcp: &Rvalue, vars: &VarTable) -> Rvalue {
    let ty = value.ty(vars);
    Rvalue::binop(ExprOp::Mul, ty, value, rcp.clone())
}
