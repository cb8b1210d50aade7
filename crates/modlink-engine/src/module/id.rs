//! Generation-checked module handles

use std::fmt;

/// Handle to a module record in a [`ModuleGraph`](super::ModuleGraph)
///
/// The generation changes every time a slot is reused, so a handle to a
/// destroyed record never aliases the record that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    index: u32,
    generation: u32,
}

impl ModuleId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this handle was issued for
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}v{}", self.index, self.generation)
    }
}
