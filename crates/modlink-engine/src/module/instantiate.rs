//! Instantiation
//!
//! Runs in two phases:
//!
//! 1. **Settle**: walk every reachable module that is not instantiated yet
//!    and turn each resolution cache entry into a concrete [`ModuleId`].
//!    Missing, pending, rejected, or dangling resolutions fail here, before
//!    any record changes state.
//! 2. **Link**: depth-first walk over the settled handles, binding each
//!    unit's imports. Modules already `Instantiating` are treated as
//!    satisfied, which is what lets cycles close. Strongly connected
//!    components are tracked with a dfs index and ancestor index so a
//!    cycle's members become `Instantiated` together.

use super::{LinkStatus, ModuleGraph, ModuleId};
use crate::error::LinkError;
use crate::unit::LinkedImports;
use rustc_hash::{FxHashMap, FxHashSet};
use std::task::Poll;
use tracing::{debug, trace, warn};

type SettledImports = FxHashMap<String, ModuleId>;

impl ModuleGraph {
    /// Instantiate a module and everything it transitively imports
    ///
    /// Every specifier of every reachable module must already have a
    /// settled resolution in its cache (see [`link`](Self::link)); this
    /// call never waits. On success each newly instantiated module's cache
    /// is cleared. On failure the module is left `Errored` and later calls
    /// return the same error. Instantiating an instantiated module is a
    /// no-op.
    pub fn instantiate(&mut self, id: ModuleId) -> Result<(), LinkError> {
        let record = self.live(id)?;
        match &record.link {
            LinkStatus::Instantiated | LinkStatus::Instantiating { .. } => return Ok(()),
            LinkStatus::Errored(err) => return Err(err.clone()),
            LinkStatus::Uninstantiated => {}
        }
        debug!(module = %id, url = %record.url, "instantiating");

        let plan = match self.settle(id) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(module = %id, error = %err, "instantiation failed before linking");
                self.live_mut(id)?.link = LinkStatus::Errored(err.clone());
                return Err(err);
            }
        };
        for (member, linked) in plan {
            self.live_mut(member)?.linked = linked;
        }

        let mut stack = Vec::new();
        if let Err(err) = self.inner_instantiate(id, &mut stack, 0, 0) {
            warn!(module = %id, error = %err, errored = stack.len(), "instantiation failed");
            for member in stack {
                if let Some(record) = self.record_mut(member) {
                    record.link = LinkStatus::Errored(err.clone());
                }
            }
            return Err(err);
        }

        debug!(module = %id, "instantiated");
        Ok(())
    }

    /// Resolve every cache entry reachable from `root` to a handle
    fn settle(&self, root: ModuleId) -> Result<Vec<(ModuleId, SettledImports)>, LinkError> {
        let mut plan = Vec::new();
        let mut seen = FxHashSet::default();
        let mut pending = vec![root];
        seen.insert(root);

        while let Some(id) = pending.pop() {
            let record = self.live(id)?;
            match &record.link {
                LinkStatus::Instantiated => continue,
                LinkStatus::Errored(err) => return Err(err.clone()),
                LinkStatus::Uninstantiated | LinkStatus::Instantiating { .. } => {}
            }

            let mut settled = SettledImports::default();
            let mut next = Vec::new();
            for specifier in record.distinct_requests() {
                let eventual =
                    record
                        .cache
                        .get(specifier)
                        .ok_or_else(|| LinkError::UnresolvedSpecifier {
                            specifier: specifier.clone(),
                            referrer: record.url.clone(),
                        })?;
                let dependency = match eventual.peek() {
                    Poll::Pending => {
                        return Err(LinkError::NotReady {
                            specifier: specifier.clone(),
                            referrer: record.url.clone(),
                        })
                    }
                    Poll::Ready(Err(source)) => {
                        return Err(LinkError::Resolver {
                            specifier: specifier.clone(),
                            referrer: record.url.clone(),
                            source,
                        })
                    }
                    Poll::Ready(Ok(dependency)) => dependency,
                };
                if !self.contains(dependency) {
                    return Err(LinkError::NotAModule {
                        specifier: specifier.clone(),
                        referrer: record.url.clone(),
                    });
                }
                settled.insert(specifier.clone(), dependency);
                if seen.insert(dependency) {
                    next.push(dependency);
                }
            }

            // Reversed so dependencies are visited in declaration order.
            pending.extend(next.into_iter().rev());
            plan.push((id, settled));
        }

        Ok(plan)
    }

    /// Depth-first link step; returns the next free dfs index
    fn inner_instantiate(
        &mut self,
        id: ModuleId,
        stack: &mut Vec<ModuleId>,
        index: u32,
        depth: usize,
    ) -> Result<u32, LinkError> {
        let record = self.live(id)?;
        match &record.link {
            LinkStatus::Instantiating { .. } | LinkStatus::Instantiated => return Ok(index),
            LinkStatus::Errored(err) => return Err(err.clone()),
            LinkStatus::Uninstantiated => {}
        }
        if let Some(limit) = self.options.exceeded(depth) {
            return Err(LinkError::DepthExceeded {
                url: record.url.clone(),
                limit,
            });
        }
        let dependencies = record.linked_dependencies()?;

        let dfs_index = index;
        let mut ancestor = index;
        self.live_mut(id)?.link = LinkStatus::Instantiating {
            dfs_index,
            ancestor,
        };
        stack.push(id);
        trace!(module = %id, dfs_index, "module instantiating");

        let mut index = index + 1;
        for dependency in dependencies {
            index = self.inner_instantiate(dependency, stack, index, depth + 1)?;
            if let LinkStatus::Instantiating {
                ancestor: dependency_ancestor,
                ..
            } = self.live(dependency)?.link
            {
                ancestor = ancestor.min(dependency_ancestor);
                self.live_mut(id)?.link = LinkStatus::Instantiating {
                    dfs_index,
                    ancestor,
                };
            }
        }

        self.bind_imports(id)?;

        if ancestor == dfs_index {
            // `id` roots a component: everything above it on the stack is
            // part of the same cycle and is now fully linked.
            while let Some(member) = stack.pop() {
                let record = self.live_mut(member)?;
                record.link = LinkStatus::Instantiated;
                record.cache.clear();
                trace!(module = %member, url = %record.url, "module instantiated");
                if member == id {
                    break;
                }
            }
        }

        Ok(index)
    }

    /// Hand a unit the namespaces of its settled dependencies
    fn bind_imports(&mut self, id: ModuleId) -> Result<(), LinkError> {
        let record = self.live(id)?;
        let unit = record.unit.as_ref();

        let mut imports = LinkedImports::new();
        for specifier in record.distinct_requests() {
            let dependency = self.resolve_callback(unit, specifier)?;
            let namespace = self.live(dependency)?.unit.namespace();
            imports.insert(specifier.clone(), namespace);
        }
        let url = record.url.clone();

        self.live_mut(id)?
            .unit
            .instantiate_self(&imports)
            .map_err(|source| LinkError::Binding { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindingError, ResolveError};
    use crate::module::{Eventual, LinkState, Referrer};

    fn link_all(graph: &mut ModuleGraph, table: &[(ModuleId, &str, ModuleId)]) {
        let ids: Vec<ModuleId> = graph.ids().collect();
        for id in ids {
            let mut resolver = |referrer: Referrer<'_>, specifier: &str| {
                table
                    .iter()
                    .find(|(from, spec, _)| *from == referrer.id && *spec == specifier)
                    .map(|(_, _, to)| Eventual::fulfilled(*to))
                    .ok_or_else(|| ResolveError::failed(specifier))
            };
            graph.link(id, &mut resolver).unwrap();
        }
    }

    #[test]
    fn test_instantiate_chain() {
        let mut graph = ModuleGraph::new();
        let a = graph.create_module(r#"import "./b";"#, "memory:///a").unwrap();
        let b = graph.create_module(r#"import "./c";"#, "memory:///b").unwrap();
        let c = graph.create_module("1;", "memory:///c").unwrap();
        link_all(&mut graph, &[(a, "./b", b), (b, "./c", c)]);

        graph.instantiate(a).unwrap();

        for id in [a, b, c] {
            assert_eq!(graph.link_state(id), Some(LinkState::Instantiated));
            assert_eq!(graph.record(id).unwrap().cache_len(), 0);
        }
        assert_eq!(graph.record(a).unwrap().dependency("./b"), Some(b));
    }

    #[test]
    fn test_self_import() {
        let mut graph = ModuleGraph::new();
        let a = graph
            .create_module(r#"import * as me from "./a"; export let x = 1;"#, "memory:///a")
            .unwrap();
        link_all(&mut graph, &[(a, "./a", a)]);

        graph.instantiate(a).unwrap();
        assert_eq!(graph.link_state(a), Some(LinkState::Instantiated));
    }

    #[test]
    fn test_pending_dependency_is_not_ready() {
        let mut graph = ModuleGraph::new();
        let a = graph.create_module(r#"import "./b";"#, "memory:///a").unwrap();
        let (eventual, _settler) = Eventual::<ModuleId>::pending();
        let mut resolver = |_: Referrer<'_>, _: &str| -> Result<Eventual<ModuleId>, ResolveError> {
            Ok(eventual.clone())
        };
        graph.link(a, &mut resolver).unwrap();

        let err = graph.instantiate(a).unwrap_err();
        assert_eq!(
            err,
            LinkError::NotReady {
                specifier: "./b".to_string(),
                referrer: "memory:///a".to_string(),
            }
        );
        assert_eq!(graph.link_state(a), Some(LinkState::Errored));
        // Stored failure is re-raised without re-checking the cache.
        assert_eq!(graph.instantiate(a).unwrap_err(), err);
    }

    #[test]
    fn test_rejected_dependency_propagates() {
        let mut graph = ModuleGraph::new();
        let a = graph.create_module(r#"import "./b";"#, "memory:///a").unwrap();
        let mut resolver = |_: Referrer<'_>, _: &str| -> Result<Eventual<ModuleId>, ResolveError> {
            Ok(Eventual::rejected(ResolveError::failed("offline")))
        };
        graph.link(a, &mut resolver).unwrap();

        let err = graph.instantiate(a).unwrap_err();
        assert!(matches!(
            err,
            LinkError::Resolver { source: ResolveError::Failed(ref m), .. } if m == "offline"
        ));
    }

    #[test]
    fn test_missing_export_errors_stack_only() {
        let mut graph = ModuleGraph::new();
        let a = graph
            .create_module(r#"import "./ok"; import "./b";"#, "memory:///a")
            .unwrap();
        let ok = graph.create_module("export let y = 1;", "memory:///ok").unwrap();
        let b = graph
            .create_module(r#"import { nope } from "./c";"#, "memory:///b")
            .unwrap();
        let c = graph.create_module("export let x = 1;", "memory:///c").unwrap();
        link_all(&mut graph, &[(a, "./ok", ok), (a, "./b", b), (b, "./c", c)]);

        let err = graph.instantiate(a).unwrap_err();
        assert_eq!(
            err,
            LinkError::Binding {
                url: "memory:///b".to_string(),
                source: BindingError::MissingExport {
                    specifier: "./c".to_string(),
                    name: "nope".to_string(),
                },
            }
        );
        assert_eq!(graph.link_state(a), Some(LinkState::Errored));
        assert_eq!(graph.link_state(b), Some(LinkState::Errored));
        // Completed before the failure, and not part of the failing path.
        assert_eq!(graph.link_state(ok), Some(LinkState::Instantiated));
        assert_eq!(graph.link_state(c), Some(LinkState::Instantiated));
    }

    #[test]
    fn test_cycle_members_finish_together() {
        let mut graph = ModuleGraph::new();
        let a = graph.create_module(r#"import "./b";"#, "memory:///a").unwrap();
        let b = graph.create_module(r#"import "./c";"#, "memory:///b").unwrap();
        let c = graph
            .create_module(r#"import "./a"; import "./bad";"#, "memory:///c")
            .unwrap();
        let bad = graph
            .create_module(r#"import { missing } from "./a";"#, "memory:///bad")
            .unwrap();
        link_all(
            &mut graph,
            &[(a, "./b", b), (b, "./c", c), (c, "./a", a), (c, "./bad", bad), (bad, "./a", a)],
        );

        graph.instantiate(a).unwrap_err();
        // The whole cycle was still on the stack when `bad` failed.
        for id in [a, b, c, bad] {
            assert_eq!(graph.link_state(id), Some(LinkState::Errored));
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut graph =
            ModuleGraph::new().with_options(crate::options::GraphOptions::new().with_max_depth(1));
        let a = graph.create_module(r#"import "./b";"#, "memory:///a").unwrap();
        let b = graph.create_module(r#"import "./c";"#, "memory:///b").unwrap();
        let c = graph.create_module("1;", "memory:///c").unwrap();
        link_all(&mut graph, &[(a, "./b", b), (b, "./c", c)]);

        assert_eq!(
            graph.instantiate(a).unwrap_err(),
            LinkError::DepthExceeded {
                url: "memory:///c".to_string(),
                limit: 1,
            }
        );
    }
}
