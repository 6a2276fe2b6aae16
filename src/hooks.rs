//! Hook store: order-addressed local state and effects.
//!
//! While a component is being evaluated the work loop installs a render frame
//! in a thread-local (see [`RenderScope`]). [`use_state`] and [`use_effect`]
//! read the frame to find the slot recorded at the same call index on the
//! previous pass, and append the slot to the fiber's new hook list.
//!
//! Slots are `Rc`-shared between a fiber and its successor. A [`SetState`]
//! handle keeps only a weak reference to its slot, so updates issued after the
//! component unmounted are dropped.
//!
//! Hooks are matched purely by call order. A component must call the same
//! hooks in the same order on every pass; any deviation is reported as
//! [`Error::HookOrder`] from that component's evaluation step.

use crate::error::Error;
use crate::props::Value;
use indexmap::IndexMap;
use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::rc::{Rc, Weak};

// Frame of the component currently being evaluated on this thread.
thread_local! {
    static CURRENT_FRAME: RefCell<Option<Rc<RefCell<RenderFrame>>>> = const { RefCell::new(None) };
}

// =========================================================================
// Pass requests
// =========================================================================

/// Flag raised by state updates asking the owning root for a new pass.
///
/// Several updates before the root looks at the flag collapse into one pass.
/// Updates raised while a component is being evaluated (typically from a
/// mount effect) are held back until the pass commits, so they never restart
/// the pass that produced them.
#[derive(Debug, Default)]
pub(crate) struct UpdateSignal {
    requested: Cell<bool>,
    deferred: Cell<bool>,
    evaluating: Cell<bool>,
}

impl UpdateSignal {
    pub(crate) fn request(&self) {
        if self.evaluating.get() {
            self.deferred.set(true);
        } else {
            self.requested.set(true);
        }
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// Clear the flag, returning whether it was set.
    pub(crate) fn take(&self) -> bool {
        self.requested.replace(false)
    }

    /// Turn updates held back during evaluation into a regular request.
    pub(crate) fn release_deferred(&self) -> bool {
        let deferred = self.deferred.replace(false);
        if deferred {
            self.requested.set(true);
        }
        deferred
    }

    /// Mark a component evaluation until the guard drops.
    pub(crate) fn evaluating(&self) -> EvaluationGuard<'_> {
        self.evaluating.set(true);
        EvaluationGuard(self)
    }
}

pub(crate) struct EvaluationGuard<'a>(&'a UpdateSignal);

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.0.evaluating.set(false);
    }
}

// =========================================================================
// Slots
// =========================================================================

enum Update<S> {
    Replace(S),
    Apply(Box<dyn FnOnce(&S) -> S>),
}

pub(crate) struct StateSlot<S> {
    state: RefCell<S>,
    queue: RefCell<Vec<Update<S>>>,
}

impl<S: Clone + 'static> StateSlot<S> {
    fn new(initial: S) -> Self {
        Self {
            state: RefCell::new(initial),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Apply queued updates in enqueue order and return the settled state.
    fn settle(&self) -> S {
        loop {
            let batch = std::mem::take(&mut *self.queue.borrow_mut());
            if batch.is_empty() {
                break;
            }
            for update in batch {
                let next = match update {
                    Update::Replace(value) => value,
                    Update::Apply(f) => {
                        let prev = self.state.borrow().clone();
                        f(&prev)
                    }
                };
                *self.state.borrow_mut() = next;
            }
        }
        self.state.borrow().clone()
    }
}

/// Cleanup returned by an effect, run before the effect re-runs or when its
/// component is removed.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wrap a cleanup closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self(Box::new(f))
    }

    fn run(self) {
        (self.0)();
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// Return types accepted from an effect callback.
pub trait IntoCleanup {
    /// Convert into an optional cleanup.
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

struct LastEffect {
    deps: Option<Box<dyn Any>>,
    cleanup: Option<Cleanup>,
}

#[derive(Default)]
pub(crate) struct EffectSlot {
    last: Option<LastEffect>,
}

impl EffectSlot {
    fn take_cleanup(&mut self) -> Option<Cleanup> {
        self.last.as_mut().and_then(|last| last.cleanup.take())
    }
}

/// One order-addressed hook record of a fiber.
#[derive(Clone)]
pub(crate) enum Hook {
    State(Rc<dyn Any>),
    Effect(Rc<RefCell<EffectSlot>>),
}

impl Hook {
    fn kind(&self) -> &'static str {
        match self {
            Hook::State(_) => "use_state",
            Hook::Effect(_) => "use_effect",
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Run the registered cleanups of `hooks` in index order.
///
/// Each cleanup is taken out of its slot before it runs, so it can never run
/// twice even if the same fibers are deleted again by a restarted pass.
pub(crate) fn run_cleanups(hooks: &[Hook]) -> usize {
    let mut ran = 0;
    for hook in hooks {
        if let Hook::Effect(slot) = hook {
            let cleanup = slot.borrow_mut().take_cleanup();
            if let Some(cleanup) = cleanup {
                cleanup.run();
                ran += 1;
            }
        }
    }
    ran
}

// =========================================================================
// Render frame
// =========================================================================

pub(crate) struct RenderFrame {
    component: String,
    previous: Option<Vec<Hook>>,
    hooks: Vec<Hook>,
    updates: Rc<UpdateSignal>,
    violation: Option<Error>,
}

impl RenderFrame {
    /// Frame for one component evaluation. `previous` holds the alternate's
    /// hooks, or `None` on first mount.
    pub(crate) fn new(
        component: impl Into<String>,
        previous: Option<Vec<Hook>>,
        updates: Rc<UpdateSignal>,
    ) -> Self {
        Self {
            component: component.into(),
            previous,
            hooks: Vec::new(),
            updates,
            violation: None,
        }
    }

    fn violate(&mut self, index: usize, expected: impl Into<String>, found: impl Into<String>) {
        if self.violation.is_some() {
            return;
        }
        let error = Error::HookOrder {
            component: self.component.clone(),
            index,
            expected: expected.into(),
            found: found.into(),
        };
        log::warn!("{error}");
        self.violation = Some(error);
    }

    fn previous_hook(&mut self, index: usize, found: &str) -> Option<Hook> {
        let hook = match &self.previous {
            None => return None,
            Some(previous) => previous.get(index).cloned(),
        };
        if hook.is_none() {
            self.violate(index, "no hook call", found);
        }
        hook
    }

    fn state_slot<S: Clone + 'static>(&mut self, initial: S) -> Rc<StateSlot<S>> {
        let index = self.hooks.len();
        let found = format!("use_state::<{}>", type_name::<S>());
        let slot = match self.previous_hook(index, &found) {
            Some(Hook::State(any)) => match Rc::downcast::<StateSlot<S>>(any) {
                Ok(slot) => Some(slot),
                Err(_) => {
                    self.violate(index, "use_state of another type", found);
                    None
                }
            },
            Some(other) => {
                self.violate(index, other.kind(), found);
                None
            }
            None => None,
        };
        let slot = slot.unwrap_or_else(|| Rc::new(StateSlot::new(initial)));
        self.hooks.push(Hook::State(slot.clone()));
        slot
    }

    fn effect_slot(&mut self) -> Rc<RefCell<EffectSlot>> {
        let index = self.hooks.len();
        let slot = match self.previous_hook(index, "use_effect") {
            Some(Hook::Effect(slot)) => Some(slot),
            Some(other) => {
                self.violate(index, other.kind(), "use_effect");
                None
            }
            None => None,
        };
        let slot = slot.unwrap_or_default();
        self.hooks.push(Hook::Effect(slot.clone()));
        slot
    }

    fn check_count(&mut self) {
        let Some(previous) = &self.previous else {
            return;
        };
        if let Some(missing) = previous.get(self.hooks.len()) {
            let expected = missing.kind();
            let index = self.hooks.len();
            self.violate(index, expected, "no hook call");
        }
    }
}

/// Hooks recorded by one component evaluation.
pub(crate) struct RenderOutcome {
    pub(crate) hooks: Vec<Hook>,
    pub(crate) violation: Option<Error>,
}

/// RAII guard installing a [`RenderFrame`] for the duration of one component
/// call. The previous frame is restored when the guard drops, even if the
/// component panics.
pub(crate) struct RenderScope {
    frame: Rc<RefCell<RenderFrame>>,
    outer: Option<Rc<RefCell<RenderFrame>>>,
}

impl RenderScope {
    pub(crate) fn enter(frame: RenderFrame) -> Self {
        let frame = Rc::new(RefCell::new(frame));
        let outer = CURRENT_FRAME.with(|current| current.replace(Some(Rc::clone(&frame))));
        Self { frame, outer }
    }

    /// Leave the frame and collect the hooks the component called.
    pub(crate) fn finish(self) -> RenderOutcome {
        let outcome = {
            let mut frame = self.frame.borrow_mut();
            frame.check_count();
            RenderOutcome {
                hooks: std::mem::take(&mut frame.hooks),
                violation: frame.violation.take(),
            }
        };
        drop(self);
        outcome
    }
}

impl Drop for RenderScope {
    fn drop(&mut self) {
        let outer = self.outer.take();
        CURRENT_FRAME.with(|current| {
            *current.borrow_mut() = outer;
        });
    }
}

fn with_frame<R>(hook: &str, f: impl FnOnce(&mut RenderFrame) -> R) -> R {
    let frame = CURRENT_FRAME.with(|current| current.borrow().clone());
    let Some(frame) = frame else {
        panic!("`{hook}` called outside of component evaluation");
    };
    let mut frame = frame.borrow_mut();
    f(&mut frame)
}

// =========================================================================
// State
// =========================================================================

/// Shallow merge of a partial value onto a prior state.
pub trait Merge {
    /// Merge `partial` into `self`, replacing entries present in both.
    fn merge(&mut self, partial: Self);
}

impl Merge for Value {
    /// Maps merge entry by entry; any other combination replaces outright.
    fn merge(&mut self, partial: Self) {
        match (self, partial) {
            (Value::Map(current), Value::Map(partial)) => current.extend(partial),
            (current, partial) => *current = partial,
        }
    }
}

impl<K: Hash + Eq, V, H: BuildHasher> Merge for IndexMap<K, V, H> {
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K: Hash + Eq, V, H: BuildHasher> Merge for HashMap<K, V, H> {
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K: Ord, V> Merge for BTreeMap<K, V> {
    fn merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

/// Setter returned by [`use_state`].
///
/// Every call queues an update on the component's slot and asks the root for a
/// new pass. Queued updates apply in call order the next time the component
/// renders.
pub struct SetState<S> {
    slot: Weak<StateSlot<S>>,
    updates: Rc<UpdateSignal>,
}

impl<S> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Weak::clone(&self.slot),
            updates: Rc::clone(&self.updates),
        }
    }
}

impl<S> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("state", &type_name::<S>())
            .field("mounted", &(self.slot.strong_count() > 0))
            .finish()
    }
}

impl<S: Clone + 'static> SetState<S> {
    /// Replace the state.
    pub fn set(&self, value: S) {
        self.enqueue(Update::Replace(value));
    }

    /// Compute the next state from the state settled so far.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S + 'static,
    {
        self.enqueue(Update::Apply(Box::new(f)));
    }

    /// Shallow-merge `partial` onto the state, see [`Merge`].
    pub fn merge(&self, partial: S)
    where
        S: Merge,
    {
        self.update(move |prev| {
            let mut next = prev.clone();
            next.merge(partial);
            next
        });
    }

    fn enqueue(&self, update: Update<S>) {
        let Some(slot) = self.slot.upgrade() else {
            log::trace!("dropping state update for unmounted component");
            return;
        };
        slot.queue.borrow_mut().push(update);
        self.updates.request();
    }
}

/// Local state of the component being evaluated.
///
/// On first mount the state is `initial`; afterwards `initial` is ignored and
/// the settled state of the same slot from the previous pass is returned.
///
/// # Panics
///
/// Panics when called outside of component evaluation.
pub fn use_state<S: Clone + 'static>(initial: S) -> (S, SetState<S>) {
    let (slot, updates) = with_frame("use_state", |frame| {
        (frame.state_slot(initial), Rc::clone(&frame.updates))
    });
    let state = slot.settle();
    let set_state = SetState {
        slot: Rc::downgrade(&slot),
        updates,
    };
    (state, set_state)
}

// =========================================================================
// Effects
// =========================================================================

fn effect_hook<F, C, G>(callback: F, deps: Option<Box<dyn Any>>, changed: G)
where
    F: FnOnce() -> C,
    C: IntoCleanup,
    G: FnOnce(Option<&dyn Any>, Option<&dyn Any>) -> bool,
{
    let slot = with_frame("use_effect", RenderFrame::effect_slot);

    let should_run = match &slot.borrow().last {
        None => true,
        Some(last) => changed(last.deps.as_deref(), deps.as_deref()),
    };
    if !should_run {
        return;
    }

    let previous = slot.borrow_mut().take_cleanup();
    if let Some(cleanup) = previous {
        cleanup.run();
    }
    let cleanup = callback().into_cleanup();
    slot.borrow_mut().last = Some(LastEffect { deps, cleanup });
}

/// Run `callback` on mount and whenever `deps` differs from the previous pass.
///
/// The callback runs synchronously during component evaluation. Before it
/// re-runs, the cleanup it returned last time runs. When `deps` compares equal
/// to the previous pass both are skipped. Pass a `Vec` or tuple to depend on
/// several values; lists of different lengths or types always count as
/// changed.
///
/// # Panics
///
/// Panics when called outside of component evaluation.
pub fn use_effect<F, C, D>(callback: F, deps: D)
where
    F: FnOnce() -> C,
    C: IntoCleanup,
    D: PartialEq + 'static,
{
    effect_hook(callback, Some(Box::new(deps)), |previous, next| {
        let previous = previous.and_then(|p| p.downcast_ref::<D>());
        let next = next.and_then(|n| n.downcast_ref::<D>());
        match (previous, next) {
            (Some(previous), Some(next)) => previous != next,
            _ => true,
        }
    });
}

/// Run `callback` on every pass, cleaning up the previous run first.
///
/// # Panics
///
/// Panics when called outside of component evaluation.
pub fn use_effect_always<F, C>(callback: F)
where
    F: FnOnce() -> C,
    C: IntoCleanup,
{
    effect_hook(callback, None, |_, _| true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::ValueMap;

    #[test]
    fn value_maps_merge_and_scalars_replace() {
        let mut map = ValueMap::default();
        map.insert("a".into(), Value::Int(1));
        let mut state = Value::Map(map.clone());

        map.insert("a".into(), Value::Int(2));
        map.insert("b".into(), Value::Bool(true));
        state.merge(Value::Map(map.clone()));
        assert_eq!(state, Value::Map(map));

        state.merge(Value::from("flat"));
        assert_eq!(state, Value::from("flat"));
    }

    #[test]
    fn settle_applies_updates_in_enqueue_order() {
        let slot = StateSlot::new(1);
        slot.queue.borrow_mut().push(Update::Apply(Box::new(|n| n + 1)));
        slot.queue.borrow_mut().push(Update::Replace(10));
        slot.queue.borrow_mut().push(Update::Apply(Box::new(|n| n * 2)));
        assert_eq!(slot.settle(), 20);
        assert_eq!(slot.settle(), 20);
    }

    #[test]
    fn render_scope_restores_outer_frame() {
        let updates = Rc::new(UpdateSignal::default());
        let outer = RenderScope::enter(RenderFrame::new("outer", None, Rc::clone(&updates)));
        {
            let inner = RenderScope::enter(RenderFrame::new("inner", None, Rc::clone(&updates)));
            let _ = use_state(0u8);
            let outcome = inner.finish();
            assert_eq!(outcome.hooks.len(), 1);
        }
        let outcome = outer.finish();
        assert!(outcome.hooks.is_empty());
        assert!(outcome.violation.is_none());
        assert!(CURRENT_FRAME.with(|current| current.borrow().is_none()));
    }

    #[test]
    fn cleanups_run_once() {
        let count = Rc::new(Cell::new(0));
        let counted = Rc::clone(&count);
        let updates = Rc::new(UpdateSignal::default());
        let scope = RenderScope::enter(RenderFrame::new("c", None, updates));
        use_effect_always(move || Cleanup::new(move || counted.set(counted.get() + 1)));
        let hooks = scope.finish().hooks;
        assert_eq!(run_cleanups(&hooks), 1);
        assert_eq!(run_cleanups(&hooks), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn setter_requests_a_pass() {
        let updates = Rc::new(UpdateSignal::default());
        let scope = RenderScope::enter(RenderFrame::new("c", None, Rc::clone(&updates)));
        let (_, set) = use_state(0);
        let hooks = scope.finish().hooks;
        set.set(1);
        set.set(2);
        assert!(updates.take());
        assert!(!updates.take());
        drop(hooks);
        set.set(3);
        assert!(!updates.is_requested());
    }

    #[test]
    fn updates_during_evaluation_are_deferred() {
        let updates = UpdateSignal::default();
        {
            let _evaluating = updates.evaluating();
            updates.request();
        }
        assert!(!updates.is_requested());
        assert!(updates.release_deferred());
        assert!(updates.take());

        updates.request();
        assert!(!updates.release_deferred());
        assert!(updates.take());
    }
}
