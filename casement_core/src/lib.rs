// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split-tree layout and cooperative frame scheduling for embedded views.
//!
//! `casement_core` divides a window's rectangle among components with a
//! split tree, and drives any number of windows through deadline-aware frame
//! cycles. It is `no_std` compatible (with `alloc`); the layout tree uses
//! array-based struct-of-arrays storage with generational handles.
//!
//! # Architecture
//!
//! ```text
//!   update requests ──► UpdateChannel ──► waker (host arms a frame callback)
//!     (components,            ▲                      │
//!      windows, jobs)         │                      ▼
//!                             │           TimingBelt::run_frame()
//!                             │                      │
//!                             │     tick ──► paint/render per window ──► CycleSummary
//!                             │                      │                        │
//!                             └──── needs update ◄───┘          idle_armed ───┘
//!                                                                     │
//!                                                                     ▼
//!                                                      TimingBelt::on_idle_timer()
//! ```
//!
//! **[`layout`]**: split tree of horizontal and vertical partitions with
//! components at the leaves. Computes each component's rectangle.
//!
//! **[`window`]**: the [`Surface`](window::Surface) and
//! [`RenderTarget`](window::RenderTarget) seams, and [`Window`](window::Window),
//! which owns a surface, a layout, and the components placed in it.
//!
//! **[`component`]**: the [`Component`](component::Component) contract and the
//! closure-backed [`ProxyComponent`](component::ProxyComponent).
//!
//! **[`belt`]**: [`TimingBelt`](belt::TimingBelt), the cycle and idle-job
//! scheduler.
//!
//! **[`idle`]**: the FIFO of resumable idle jobs.
//!
//! **[`update`]**: coalescing update requests into a single pending cycle.
//!
//! **[`time`]**: [`HostTime`](time::HostTime) and the [`Clock`](time::Clock)
//! seam.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! cycle instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies and
//!   provides [`StdClock`](time::StdClock).
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod belt;
pub mod component;
pub mod error;
pub mod id;
pub mod idle;
pub mod layout;
pub mod time;
pub mod trace;
pub mod update;
pub mod window;
