//! Evaluation
//!
//! Dependencies run before dependents and every unit body runs at most once.
//! A module already `Evaluating` is skipped when reached again, so a cycle
//! member may observe a peer whose body has not finished.

use super::{EvalStatus, LinkStatus, ModuleGraph, ModuleId};
use crate::error::RuntimeError;
use crate::unit::Value;
use tracing::{debug, trace, warn};

impl ModuleGraph {
    /// Evaluate an instantiated module and its dependencies
    ///
    /// Returns the module's completion value. Evaluating a module a second
    /// time returns the cached value or the stored failure without running
    /// anything.
    pub fn evaluate(&mut self, id: ModuleId) -> Result<Value, RuntimeError> {
        let record = self.record(id).ok_or(RuntimeError::InvalidHandle(id))?;
        match &record.link {
            LinkStatus::Instantiated => {}
            LinkStatus::Errored(source) => {
                return Err(RuntimeError::Unlinked {
                    url: record.url.clone(),
                    source: source.clone(),
                })
            }
            LinkStatus::Uninstantiated | LinkStatus::Instantiating { .. } => {
                return Err(RuntimeError::NotInstantiated {
                    url: record.url.clone(),
                })
            }
        }

        self.inner_evaluate(id, 0)?;

        let record = self.record(id).ok_or(RuntimeError::InvalidHandle(id))?;
        match &record.eval {
            EvalStatus::Evaluated(value) => Ok(value.clone()),
            EvalStatus::Errored(err) => Err(err.clone()),
            EvalStatus::NotEvaluated | EvalStatus::Evaluating => Ok(Value::Undefined),
        }
    }

    fn inner_evaluate(&mut self, id: ModuleId, depth: usize) -> Result<(), RuntimeError> {
        let record = self.record(id).ok_or(RuntimeError::InvalidHandle(id))?;
        match &record.eval {
            EvalStatus::Evaluated(_) | EvalStatus::Evaluating => return Ok(()),
            EvalStatus::Errored(err) => return Err(err.clone()),
            EvalStatus::NotEvaluated => {}
        }
        let url = record.url.clone();
        if let Some(limit) = self.options.exceeded(depth) {
            return Err(RuntimeError::DepthExceeded { url, limit });
        }
        let dependencies = match record.linked_dependencies() {
            Ok(dependencies) => dependencies,
            Err(source) => return Err(RuntimeError::Unlinked { url, source }),
        };

        self.set_eval(id, EvalStatus::Evaluating);
        trace!(module = %id, url = %url, "module evaluating");

        for dependency in dependencies {
            if let Err(err) = self.inner_evaluate(dependency, depth + 1) {
                self.set_eval(id, EvalStatus::Errored(err.clone()));
                return Err(err);
            }
        }

        let result = match self.record_mut(id) {
            Some(record) => record.unit.evaluate_self(),
            None => return Err(RuntimeError::InvalidHandle(id)),
        };
        match result {
            Ok(value) => {
                debug!(module = %id, url = %url, "module evaluated");
                self.set_eval(id, EvalStatus::Evaluated(value));
                Ok(())
            }
            Err(exception) => {
                let err = RuntimeError::Exception {
                    url,
                    message: exception.message,
                };
                warn!(module = %id, error = %err, "module evaluation threw");
                self.set_eval(id, EvalStatus::Errored(err.clone()));
                Err(err)
            }
        }
    }

    fn set_eval(&mut self, id: ModuleId, status: EvalStatus) {
        if let Some(record) = self.record_mut(id) {
            record.eval = status;
        }
    }
}
