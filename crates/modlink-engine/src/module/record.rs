//! Module records

use super::{Eventual, ModuleId};
use crate::error::{LinkError, RuntimeError};
use crate::unit::{CompiledUnit, Value};
use rustc_hash::{FxHashMap, FxHashSet};

/// Instantiation state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not instantiated yet
    Uninstantiated,
    /// On the current instantiation walk
    Instantiating,
    /// Instantiated together with all its dependencies
    Instantiated,
    /// Instantiation failed; the failure is kept and re-raised
    Errored,
}

/// Evaluation state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalState {
    /// Body has not run
    NotEvaluated,
    /// Body or one of its dependencies is running
    Evaluating,
    /// Body completed; the completion value is cached
    Evaluated,
    /// Body or a dependency threw; the failure is kept and re-raised
    Errored,
}

#[derive(Debug, Clone)]
pub(crate) enum LinkStatus {
    Uninstantiated,
    Instantiating { dfs_index: u32, ancestor: u32 },
    Instantiated,
    Errored(LinkError),
}

#[derive(Debug, Clone)]
pub(crate) enum EvalStatus {
    NotEvaluated,
    Evaluating,
    Evaluated(Value),
    Errored(RuntimeError),
}

/// One compiled unit, its URL, and its resolution cache
#[derive(Debug)]
pub struct ModuleRecord {
    pub(crate) url: String,
    pub(crate) requests: Vec<String>,
    pub(crate) unit: Box<dyn CompiledUnit>,
    /// Specifier -> resolution, filled by `link`, cleared once instantiated
    pub(crate) cache: FxHashMap<String, Eventual<ModuleId>>,
    /// Specifier -> settled dependency, filled when instantiation starts
    pub(crate) linked: FxHashMap<String, ModuleId>,
    pub(crate) link: LinkStatus,
    pub(crate) eval: EvalStatus,
}

impl ModuleRecord {
    pub(crate) fn new(url: &str, unit: Box<dyn CompiledUnit>) -> Self {
        Self {
            url: url.to_string(),
            requests: unit.requests().to_vec(),
            unit,
            cache: FxHashMap::default(),
            linked: FxHashMap::default(),
            link: LinkStatus::Uninstantiated,
            eval: EvalStatus::NotEvaluated,
        }
    }

    /// URL the module was declared at
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Import specifiers in declaration order
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    /// The compiled unit this record owns
    pub fn unit(&self) -> &dyn CompiledUnit {
        self.unit.as_ref()
    }

    /// Resolution cache entry for a specifier
    pub fn cached(&self, specifier: &str) -> Option<&Eventual<ModuleId>> {
        self.cache.get(specifier)
    }

    /// Number of resolution cache entries
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Dependency a specifier was linked to, once instantiation has started
    pub fn dependency(&self, specifier: &str) -> Option<ModuleId> {
        self.linked.get(specifier).copied()
    }

    /// Instantiation state
    pub fn link_state(&self) -> LinkState {
        match self.link {
            LinkStatus::Uninstantiated => LinkState::Uninstantiated,
            LinkStatus::Instantiating { .. } => LinkState::Instantiating,
            LinkStatus::Instantiated => LinkState::Instantiated,
            LinkStatus::Errored(_) => LinkState::Errored,
        }
    }

    /// Evaluation state
    pub fn eval_state(&self) -> EvalState {
        match self.eval {
            EvalStatus::NotEvaluated => EvalState::NotEvaluated,
            EvalStatus::Evaluating => EvalState::Evaluating,
            EvalStatus::Evaluated(_) => EvalState::Evaluated,
            EvalStatus::Errored(_) => EvalState::Errored,
        }
    }

    /// Stored instantiation failure, if any
    pub fn link_error(&self) -> Option<&LinkError> {
        match &self.link {
            LinkStatus::Errored(err) => Some(err),
            _ => None,
        }
    }

    /// Stored evaluation failure, if any
    pub fn eval_error(&self) -> Option<&RuntimeError> {
        match &self.eval {
            EvalStatus::Errored(err) => Some(err),
            _ => None,
        }
    }

    /// Distinct specifiers in first-occurrence order
    pub(crate) fn distinct_requests(&self) -> impl Iterator<Item = &String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.requests
            .iter()
            .filter(move |&specifier| seen.insert(specifier.as_str()))
    }

    /// Linked dependencies in first-occurrence order of their specifiers
    pub(crate) fn linked_dependencies(&self) -> Result<Vec<ModuleId>, LinkError> {
        self.distinct_requests()
            .map(|specifier| {
                self.linked
                    .get(specifier)
                    .copied()
                    .ok_or_else(|| LinkError::UnresolvedSpecifier {
                        specifier: specifier.clone(),
                        referrer: self.url.clone(),
                    })
            })
            .collect()
    }
}
