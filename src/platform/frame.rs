//! Frame scheduling
//!
//! "Run again when the display is ready to redraw". The web host backs this
//! with `requestAnimationFrame`; tests and the headless run use
//! [`ManualScheduler`].

use std::cell::Cell;

/// Handle for one pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(pub i32);

pub trait FrameScheduler {
    /// Ask for one callback on the next frame
    fn request(&self) -> FrameToken;
    /// Cancel a request that hasn't fired yet
    fn cancel(&self, token: FrameToken);
}

/// Scheduler that only records requests
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: Cell<i32>,
    pending: Cell<Option<FrameToken>>,
    cancelled: Cell<u32>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending.get()
    }

    /// Consume the outstanding request as if the frame fired
    pub fn fire(&self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn cancelled(&self) -> u32 {
        self.cancelled.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request(&self) -> FrameToken {
        let token = FrameToken(self.next.get() + 1);
        self.next.set(token.0);
        self.pending.set(Some(token));
        token
    }

    fn cancel(&self, token: FrameToken) {
        if self.pending.get() == Some(token) {
            self.pending.set(None);
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for std::rc::Rc<S> {
    fn request(&self) -> FrameToken {
        (**self).request()
    }

    fn cancel(&self, token: FrameToken) {
        (**self).cancel(token)
    }
}
