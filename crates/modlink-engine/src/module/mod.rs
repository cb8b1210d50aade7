//! Module records and the graph that links them
//!
//! This module contains:
//! - Module records and their resolution caches
//! - The registry from unit identity to owning record
//! - The resolver contract and eventual values it returns
//! - Instantiation (link) and evaluation of a record's dependency graph

mod evaluate;
mod eventual;
mod graph;
mod id;
mod instantiate;
mod record;
mod registry;
mod resolver;

pub use eventual::{Eventual, Settler};
pub use graph::ModuleGraph;
pub use id::ModuleId;
pub use record::{EvalState, LinkState, ModuleRecord};
pub use registry::ModuleRegistry;
pub use resolver::{Referrer, Resolver};

pub(crate) use record::{EvalStatus, LinkStatus};
