//! In-progress resolution tracking

use crate::{DiError, Result};

/// Classes currently being built along one resolution chain, outermost first.
///
/// A class that is entered while already on the stack depends on itself; the
/// chain is reported instead of recursing forever.
#[derive(Debug, Default)]
pub(crate) struct ResolutionStack {
    chain: Vec<String>,
}

impl ResolutionStack {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push `class`, or fail if it is already being built.
    pub(crate) fn enter(&mut self, class: &str) -> Result<()> {
        if self.chain.iter().any(|c| c == class) {
            let mut chain = self.chain.clone();
            chain.push(class.to_owned());
            return Err(DiError::CircularDependency { chain });
        }
        self.chain.push(class.to_owned());
        Ok(())
    }

    #[inline]
    pub(crate) fn exit(&mut self) {
        self.chain.pop();
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.chain.len()
    }
}
