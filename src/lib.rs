#![deny(missing_docs)]

//! Incremental fiber reconciler with hooks and a cooperative work loop.
//!
//! Callers describe what they want on screen as a tree of immutable
//! [`Element`]s. A [`Root`] turns each description into a tree of fibers, diffs
//! it against the tree it committed last time, and applies the difference to a
//! host through the [`HostRenderer`] trait. The crate never touches a visible
//! tree itself.
//!
//! # Quick Start
//!
//! ```ignore
//! use fibra::{Element, FunctionComponent, Props, Root, use_state};
//!
//! let counter = FunctionComponent::new("Counter", |_props| {
//!     let (count, set_count) = use_state(0);
//!     Element::host("button")
//!         .prop("onClick", Handler::new(move |_| set_count.update(|n| n + 1)))
//!         .child(count)
//! });
//!
//! let mut root = Root::new(my_host, container);
//! root.render(counter.element(Props::new()));
//! root.run_to_completion()?;
//! ```
//!
//! # Core Types
//!
//! - [`Element`] - Immutable description of one node: a type and its props.
//! - [`FunctionComponent`] / [`Component`] - User code producing elements.
//! - [`Root`] - Owns a container, the committed tree and the work loop.
//! - [`HostRenderer`] - Creates, attaches and updates host nodes.
//!
//! # Work Loop
//!
//! Rendering is split into units of work, one per fiber. [`Root::work_loop`]
//! performs units until the given [`Deadline`] runs low, then returns
//! [`SliceOutcome::Yielded`] so the host can do other things. Once every unit
//! of a pass is done, the pass is committed in one go; the host never sees a
//! half-built tree.
//!
//! ```ignore
//! loop {
//!     let deadline = FrameDeadline::starting_now(Duration::from_millis(8));
//!     match root.work_loop(&deadline)? {
//!         SliceOutcome::Idle => break,
//!         SliceOutcome::Yielded | SliceOutcome::Committed => handle_input(),
//!     }
//! }
//! ```
//!
//! # Hooks
//!
//! ```ignore
//! let (value, set_value) = use_state(initial);   // state kept across passes
//! use_effect(|| subscribe(), deps);              // re-runs when deps change
//! use_effect_always(|| log_render());            // runs on every pass
//! ```
//!
//! Hooks are addressed by call order and must be called unconditionally.
//! Calling them in a different order or number than on the previous pass
//! fails the pass with [`Error::HookOrder`].

// Internal modules
pub(crate) mod arena;
mod commit;
mod config;
mod element;
mod error;
mod hash;
mod hooks;
mod host;
mod props;
mod reconcile;
mod slice;
mod work_loop;

// Description model
pub use element::{ClassComponent, Component, Element, ElementType, FunctionComponent};
pub use props::{
    EVENT_PREFIX, Handler, PropPatch, Props, TEXT_PROP, Value, ValueMap, event_name, prop_patches,
};

// Hooks
pub use hooks::{
    Cleanup, IntoCleanup, Merge, SetState, use_effect, use_effect_always, use_state,
};

// Scheduling
pub use config::{DEFAULT_FRAME_BUDGET, DEFAULT_SLACK, SchedulerConfig};
pub use slice::{Deadline, FrameDeadline, FramePacer, Unbounded, YieldPoint};
pub use work_loop::{Root, SliceOutcome};

// Host integration
pub use error::{Error, Result};
pub use hash::FastHashBuilder;
pub use host::{HostKind, HostRenderer};
