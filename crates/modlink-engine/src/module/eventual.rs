//! Settle-once values for asynchronous resolution
//!
//! A resolver hands back an [`Eventual`] immediately and settles it later
//! through the paired [`Settler`]. The linker never waits: it only peeks.
//! Callers that want to wait can `.await` an eventual, since it implements
//! [`Future`].

use crate::error::ResolveError;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(ResolveError),
}

struct Shared<T> {
    state: State<T>,
    wakers: Vec<Waker>,
}

// Wakers run after the borrow is released so they may poll the eventual.
fn settle<T>(shared: &RefCell<Shared<T>>, state: State<T>) {
    let wakers = {
        let mut shared = shared.borrow_mut();
        if !matches!(shared.state, State::Pending) {
            return;
        }
        shared.state = state;
        std::mem::take(&mut shared.wakers)
    };
    for waker in wakers {
        waker.wake();
    }
}

/// A value that is either pending, fulfilled, or rejected
///
/// Clones observe the same settlement.
pub struct Eventual<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Eventual<T> {
    fn with_state(state: State<T>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                state,
                wakers: Vec::new(),
            })),
        }
    }

    /// Create a pending eventual and the settler that completes it
    pub fn pending() -> (Self, Settler<T>) {
        let eventual = Self::with_state(State::Pending);
        let settler = Settler {
            shared: Rc::clone(&eventual.shared),
        };
        (eventual, settler)
    }

    /// Create an already-fulfilled eventual
    pub fn fulfilled(value: T) -> Self {
        Self::with_state(State::Fulfilled(value))
    }

    /// Create an already-rejected eventual
    pub fn rejected(error: ResolveError) -> Self {
        Self::with_state(State::Rejected(error))
    }

    /// Whether the eventual has been fulfilled or rejected
    pub fn is_settled(&self) -> bool {
        !matches!(self.shared.borrow().state, State::Pending)
    }
}

impl<T: Clone> Eventual<T> {
    /// Inspect the settlement without waiting
    pub fn peek(&self) -> Poll<Result<T, ResolveError>> {
        match &self.shared.borrow().state {
            State::Pending => Poll::Pending,
            State::Fulfilled(value) => Poll::Ready(Ok(value.clone())),
            State::Rejected(error) => Poll::Ready(Err(error.clone())),
        }
    }
}

impl<T> Clone for Eventual<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Eventual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shared.borrow().state {
            State::Pending => f.write_str("Eventual(<pending>)"),
            State::Fulfilled(value) => f.debug_tuple("Eventual").field(value).finish(),
            State::Rejected(error) => write!(f, "Eventual(<rejected: {}>)", error),
        }
    }
}

impl<T: Clone> Future for Eventual<T> {
    type Output = Result<T, ResolveError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let ready = self.peek();
        if ready.is_pending() {
            let mut shared = self.shared.borrow_mut();
            if !shared.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                shared.wakers.push(cx.waker().clone());
            }
        }
        ready
    }
}

/// Completes a pending [`Eventual`]
///
/// Dropping a settler that never settled rejects its eventual with
/// [`ResolveError::Abandoned`].
pub struct Settler<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Settler<T> {
    /// Fulfill the eventual with a value
    pub fn fulfill(self, value: T) {
        settle(&self.shared, State::Fulfilled(value));
    }

    /// Reject the eventual with an error
    pub fn reject(self, error: ResolveError) {
        settle(&self.shared, State::Rejected(error));
    }
}

impl<T> Drop for Settler<T> {
    fn drop(&mut self) {
        settle(&self.shared, State::Rejected(ResolveError::Abandoned));
    }
}

impl<T> fmt::Debug for Settler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Settler")
    }
}
