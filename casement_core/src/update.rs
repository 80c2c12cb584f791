// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update request fan-in.
//!
//! Any component can ask the belt for another cycle. Requests flow upward
//! through a chain of links and collapse into a single pending flag:
//!
//! ```text
//!   component ──► UpdateRelay (child) ──► UpdateRelay (window) ──► UpdateSender
//!                                                                       │
//!                                              UpdateChannel ◄──────────┘
//!                                              (pending flag + host waker)
//! ```
//!
//! The [`UpdateChannel`] is owned by the belt. It hands out [`UpdateSender`]s
//! to registered windows, which connect their [`UpdateRelay`]; each mounted
//! component receives a child relay. Disconnecting a relay (window removed
//! from the belt, component removed from the window) immediately stops its
//! requests from reaching the channel.
//!
//! Requests are idempotent: only the transition from idle to pending wakes
//! the host, so many requests within one frame produce one cycle.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::{Cell, RefCell};
use core::fmt;

type Waker = Box<dyn FnMut()>;

struct ChannelState {
    pending: Cell<bool>,
    requests: Cell<u64>,
    coalesced: Cell<u64>,
    waker: RefCell<Option<Waker>>,
}

impl ChannelState {
    fn request(&self) -> bool {
        self.requests.set(self.requests.get() + 1);
        if self.pending.get() {
            self.coalesced.set(self.coalesced.get() + 1);
            return false;
        }
        self.pending.set(true);
        // Re-entrant requests from the waker see `pending` and return early.
        if let Some(wake) = self.waker.borrow_mut().as_mut() {
            wake();
        }
        true
    }
}

/// The belt's single pending-update flag.
pub struct UpdateChannel {
    state: Rc<ChannelState>,
}

impl fmt::Debug for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateChannel")
            .field("pending", &self.state.pending.get())
            .field("requests", &self.state.requests.get())
            .field("coalesced", &self.state.coalesced.get())
            .field("has_waker", &self.state.waker.borrow().is_some())
            .finish()
    }
}

impl Default for UpdateChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateChannel {
    /// Creates an idle channel with no waker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(ChannelState {
                pending: Cell::new(false),
                requests: Cell::new(0),
                coalesced: Cell::new(0),
                waker: RefCell::new(None),
            }),
        }
    }

    /// Returns a sender feeding this channel.
    #[must_use]
    pub fn sender(&self) -> UpdateSender {
        UpdateSender {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Requests an update. Returns `true` if this call made the channel
    /// pending.
    pub fn request(&self) -> bool {
        self.state.request()
    }

    /// Returns whether an update is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.pending.get()
    }

    /// Clears the pending flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.state.pending.replace(false)
    }

    /// Installs the callback invoked when the channel becomes pending.
    ///
    /// Hosts use this to arm their frame callback (for example
    /// `requestAnimationFrame`).
    pub fn set_waker(&self, waker: impl FnMut() + 'static) {
        *self.state.waker.borrow_mut() = Some(Box::new(waker));
    }

    /// Removes the waker.
    pub fn clear_waker(&self) {
        self.state.waker.borrow_mut().take();
    }

    /// Total number of requests received.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.state.requests.get()
    }

    /// Number of requests that arrived while already pending.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.state.coalesced.get()
    }
}

/// A cloneable handle that requests updates on an [`UpdateChannel`].
///
/// Senders do not keep the channel alive; requests after the channel is
/// dropped are ignored.
#[derive(Clone)]
pub struct UpdateSender {
    state: Weak<ChannelState>,
}

impl fmt::Debug for UpdateSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSender")
            .field("live", &(self.state.strong_count() > 0))
            .finish()
    }
}

impl UpdateSender {
    /// Requests an update. Returns `true` if this call made the channel
    /// pending.
    pub fn request(&self) -> bool {
        self.state.upgrade().is_some_and(|state| state.request())
    }
}

enum Link {
    Detached,
    Sender(UpdateSender),
    Parent(UpdateRelay),
}

/// A reconnectable link in an update chain.
///
/// Clones share the same link, so reconnecting a window's relay also
/// reconnects every child relay derived from it.
#[derive(Clone)]
pub struct UpdateRelay {
    link: Rc<RefCell<Link>>,
}

impl fmt::Debug for UpdateRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = match &*self.link.borrow() {
            Link::Detached => "detached",
            Link::Sender(_) => "sender",
            Link::Parent(_) => "parent",
        };
        f.debug_struct("UpdateRelay").field("link", &link).finish()
    }
}

impl Default for UpdateRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateRelay {
    /// Creates a detached relay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            link: Rc::new(RefCell::new(Link::Detached)),
        }
    }

    /// Creates a relay that forwards to this one.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            link: Rc::new(RefCell::new(Link::Parent(self.clone()))),
        }
    }

    /// Forwards requests to `sender`, or detaches on `None`.
    pub fn connect(&self, sender: Option<UpdateSender>) {
        *self.link.borrow_mut() = sender.map_or(Link::Detached, Link::Sender);
    }

    /// Stops forwarding requests.
    pub fn detach(&self) {
        *self.link.borrow_mut() = Link::Detached;
    }

    /// Returns whether requests currently reach a live channel.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        match &*self.link.borrow() {
            Link::Detached => false,
            Link::Sender(sender) => sender.state.strong_count() > 0,
            Link::Parent(parent) => parent.is_connected(),
        }
    }

    /// Requests an update. Returns `true` if this call made the channel
    /// pending; `false` if it was already pending or the relay is detached.
    pub fn request(&self) -> bool {
        match &*self.link.borrow() {
            Link::Detached => false,
            Link::Sender(sender) => sender.request(),
            Link::Parent(parent) => parent.request(),
        }
    }
}
