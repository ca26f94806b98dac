//! Render coalescing.
//!
//! Requests made before the pending render runs are folded into it: at most one render is
//! outstanding at a time. The task that carries it out is queued by the container.

/// Tracks whether a render is outstanding and how many requests it absorbed.
#[derive(Debug, Default)]
pub(crate) struct RenderScheduler {
    pending: bool,
    coalesced: u64,
}

impl RenderScheduler {
    /// Registers a request. Returns true when the caller must queue the render task.
    pub(crate) fn request(&mut self) -> bool {
        if self.pending {
            self.coalesced = self.coalesced.saturating_add(1);
            return false;
        }
        self.pending = true;
        true
    }

    /// Claims the outstanding render. False if it was cancelled in the meantime.
    pub(crate) fn begin(&mut self) -> bool {
        core::mem::replace(&mut self.pending, false)
    }

    pub(crate) fn cancel(&mut self) {
        self.pending = false;
    }

    pub(crate) const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Requests folded into an already outstanding render.
    pub(crate) const fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
