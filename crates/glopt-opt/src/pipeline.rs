//! Fixed-point optimization driver.

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{verify, Target, Unit, VerifierError};

use crate::{
    options::OptimizationOptions,
    pass::{PassContext, PassLibrary},
    pass_id::{select, PassId},
};

/// Fatal pipeline failure.
///
/// A pass left the unit structurally invalid. This is a bug in the pass, not
/// a problem with the input program.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("IR verification failed after pass {pass}: {}", first_message(errors))]
    Verification {
        pass: PassId,
        errors: Vec<VerifierError>,
    },
}

fn first_message(errors: &[VerifierError]) -> String {
    match errors.first() {
        Some(e) if errors.len() > 1 => format!("{} (+{} more)", e, errors.len() - 1),
        Some(e) => e.to_string(),
        None => String::new(),
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// An iteration made no change
    Converged,
    /// The iteration ceiling was reached while passes still made progress
    Exhausted,
    /// The unit was empty; no pass ran
    Skipped,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub iterations: u32,
    /// Every pass application that changed the unit, tagged with its
    /// 1-based iteration number
    pub applied: Vec<(u32, PassId)>,
}

impl PipelineReport {
    pub fn converged(&self) -> bool {
        self.state == PipelineState::Converged
    }

    /// Check if any pass changed the unit.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Runs the selected passes until a fixed point or the iteration ceiling.
#[derive(Debug)]
pub struct Pipeline<'a> {
    options: &'a OptimizationOptions,
    target: &'a Target,
    library: &'a PassLibrary,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: &'a OptimizationOptions,
        target: &'a Target,
        library: &'a PassLibrary,
    ) -> Self {
        Self {
            options,
            target,
            library,
        }
    }

    /// Optimize `unit` in place.
    ///
    /// The unit is verified after every pass; the first failure aborts the
    /// run.
    pub fn run(&self, unit: &mut Unit, linked: bool) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport {
            state: PipelineState::Skipped,
            iterations: 0,
            applied: Vec::new(),
        };
        if unit.is_empty() {
            log::debug!("empty unit, optimization skipped");
            return Ok(report);
        }

        let schedule = select(self.options, self.target.stage, linked);
        log::debug!(
            "schedule ({} passes, linked={}): {:?}",
            schedule.len(),
            linked,
            schedule.iter().map(|i| i.pass.name()).collect::<Vec<_>>()
        );

        loop {
            report.iterations += 1;
            let mut progress = false;
            for invocation in &schedule {
                let Some(pass) = self.library.get(invocation.pass) else {
                    log::trace!("{}: no implementation, skipped", invocation.pass);
                    continue;
                };
                let ctx = PassContext {
                    target: self.target,
                    args: &invocation.args,
                    options: self.options,
                    library: self.library,
                };
                let changed = pass.run(unit, &ctx);
                log::trace!("{} -> {}", invocation.pass, changed);
                verify(unit).map_err(|errors| PipelineError::Verification {
                    pass: invocation.pass,
                    errors,
                })?;
                if changed {
                    report.applied.push((report.iterations, invocation.pass));
                    progress = true;
                }
            }
            log::debug!(
                "iteration {}: {}",
                report.iterations,
                if progress { "progress" } else { "no change" }
            );
            if !progress {
                report.state = PipelineState::Converged;
                break;
            }
            if report.iterations >= self.options.max_passes {
                log::warn!(
                    "optimization stopped at the pass ceiling ({}) before converging",
                    self.options.max_passes
                );
                report.state = PipelineState::Exhausted;
                break;
            }
        }
        Ok(report)
    }
}
