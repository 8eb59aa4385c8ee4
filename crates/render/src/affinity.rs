use std::thread::{self, ThreadId};

use crate::RenderError;

/// Records the thread that created a graphics context.
///
/// Every graphics call checks [`ThreadAffinity::ensure`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn ensure(&self) -> Result<(), RenderError> {
        let current = thread::current().id();
        if current == self.owner {
            Ok(())
        } else {
            Err(RenderError::WrongThread {
                owner: self.owner,
                current,
            })
        }
    }
}
