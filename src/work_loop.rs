//! The root of a rendered tree and its cooperative work loop.
//!
//! A [`Root`] owns one container node, the committed fiber tree rendered into
//! it and, while a pass is in flight, the work-in-progress tree. Work happens in
//! slices:
//!
//! 1. [`Root::render`] (or a state update) seeds a new pass,
//! 2. [`Root::work_loop`] performs units of work until the slice runs out,
//!    reporting [`SliceOutcome::Yielded`] if more work is left,
//! 3. once the last unit is done the whole pass is committed synchronously.
//!
//! ## Restarts
//!
//! A state update marks the root dirty. Before every unit of work the loop
//! checks the mark and, if a committed tree exists, throws away any in-flight
//! work and starts over from the committed root. All updates queued up to that
//! point are folded into the single restarted pass. Updates made while a
//! component is being evaluated, and any made while the very first tree is
//! still being built, are picked up right after the pass commits.

use crate::arena::{Fiber, FiberArena, FiberId};
use crate::config::SchedulerConfig;
use crate::element::{Element, ElementType};
use crate::error::{Error, Result};
use crate::hooks::{RenderFrame, RenderScope, UpdateSignal};
use crate::host::{HostKind, HostRenderer};
use crate::props::Props;
use crate::reconcile::{delete_fiber, reconcile_children};
use crate::slice::{Deadline, Unbounded, YieldPoint};
use std::fmt;
use std::rc::Rc;

/// What a call to [`Root::work_loop`] accomplished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOutcome {
    /// There was nothing to do.
    Idle,
    /// The slice ran out with work left; call again with a fresh deadline.
    Yielded,
    /// A pass finished and was committed to the host.
    Committed,
}

/// A container node and the tree rendered into it.
///
/// `Root` is single-threaded: components, hooks and setters all live on the
/// thread that drives the loop.
pub struct Root<H: HostRenderer> {
    pub(crate) host: H,
    pub(crate) config: SchedulerConfig,
    container: H::Node,
    pub(crate) arena: FiberArena<H::Node>,
    /// Committed tree.
    pub(crate) current: Option<FiberId>,
    /// Committed tree replaced by [`Root::render`], freed at the next commit.
    pub(crate) retired: Option<FiberId>,
    pub(crate) wip: Option<FiberId>,
    next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    updates: Rc<UpdateSignal>,
}

impl<H: HostRenderer> fmt::Debug for Root<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("config", &self.config)
            .field("fibers", &self.arena.len())
            .field("current", &self.current)
            .field("wip", &self.wip)
            .field("next_unit", &self.next_unit)
            .field("deletions", &self.deletions.len())
            .finish_non_exhaustive()
    }
}

impl<H: HostRenderer> Root<H> {
    /// Root rendering into `container` with the default configuration.
    pub fn new(host: H, container: H::Node) -> Self {
        Self::with_config(host, container, SchedulerConfig::default())
    }

    /// Root rendering into `container` with `config`.
    pub fn with_config(host: H, container: H::Node, config: SchedulerConfig) -> Self {
        Self {
            host,
            config,
            container,
            arena: FiberArena::default(),
            current: None,
            retired: None,
            wip: None,
            next_unit: None,
            deletions: Vec::new(),
            updates: Rc::new(UpdateSignal::default()),
        }
    }

    /// The host renderer.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host renderer, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The node this root renders into.
    pub fn container(&self) -> &H::Node {
        &self.container
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of fibers alive across the committed and in-flight trees.
    pub fn live_fibers(&self) -> usize {
        self.arena.len()
    }

    /// Whether another call to [`Root::work_loop`] would do anything.
    pub fn has_pending_work(&self) -> bool {
        self.wip.is_some() || (self.current.is_some() && self.updates.is_requested())
    }

    /// Start a fresh pass rendering `element` into the container.
    ///
    /// Any in-flight pass is dropped. A previously committed tree is torn
    /// down: its effect cleanups run now and its host nodes are removed at
    /// the next commit. Nothing is reused from it, so component state starts
    /// over.
    pub fn render(&mut self, element: Element) {
        self.discard_work_in_progress();
        // Setters of the old tree keep signalling the old, now unobserved flag.
        self.updates = Rc::new(UpdateSignal::default());

        if let Some(current) = self.current.take() {
            self.retired = Some(current);
        }
        let mut deletions = Vec::new();
        if let Some(retired) = self.retired {
            let mut child = self.arena[retired].child;
            while let Some(old) = child {
                delete_fiber(&mut self.arena, &mut deletions, old);
                child = self.arena[old].sibling;
            }
            log::debug!("render: tearing down {} committed children", deletions.len());
        }

        let mut props = Props::new();
        props.push_child(element);
        let mut root = Fiber::new(ElementType::Fragment, Rc::new(props));
        root.node = Some(self.container.clone());
        let root = self.arena.insert(root);

        self.wip = Some(root);
        self.next_unit = Some(root);
        self.deletions = deletions;
    }

    /// Perform units of work until `deadline` runs low or the pass is done.
    ///
    /// Before each unit the remaining time is compared against the configured
    /// slack; at or below it the loop yields. A finished pass is committed in
    /// full before returning, regardless of the deadline.
    ///
    /// On error the in-flight pass is dropped and the committed tree stays as
    /// it was.
    pub fn work_loop<D: Deadline + ?Sized>(&mut self, deadline: &D) -> Result<SliceOutcome> {
        self.apply_pending_updates();

        let slack = self.config.slack_duration();
        let mut performed = 0usize;
        while let Some(unit) = self.next_unit {
            if deadline.time_remaining() <= slack {
                log::trace!("yielding after {performed} units");
                return Ok(SliceOutcome::Yielded);
            }
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    log::debug!("pass aborted: {err}");
                    self.discard_work_in_progress();
                    return Err(err);
                }
            }
            performed += 1;
            self.apply_pending_updates();
        }

        if self.wip.is_none() {
            return Ok(SliceOutcome::Idle);
        }
        if let Err(err) = self.commit_root() {
            log::debug!("commit aborted: {err}");
            self.discard_work_in_progress();
            return Err(err);
        }
        // Updates raised while components were evaluated, including those
        // made during the first mount.
        if self.updates.release_deferred() {
            cov_mark::hit!(deferred_update_after_commit);
        }
        self.apply_pending_updates();
        Ok(SliceOutcome::Committed)
    }

    /// Drive the loop with slices from `yield_point` until no work is left.
    ///
    /// Returns the number of commits. The yield point must grant slices longer
    /// than the configured slack, otherwise no progress is made.
    pub fn run<Y: YieldPoint>(&mut self, yield_point: &mut Y) -> Result<usize> {
        let mut commits = 0;
        while self.has_pending_work() {
            let deadline = yield_point.request_slice();
            if self.work_loop(&deadline)? == SliceOutcome::Committed {
                commits += 1;
            }
        }
        Ok(commits)
    }

    /// Run all pending work synchronously.
    pub fn run_to_completion(&mut self) -> Result<usize> {
        self.run(&mut Unbounded)
    }

    /// Drop the in-flight tree and its queued deletions.
    pub(crate) fn discard_work_in_progress(&mut self) {
        if let Some(wip) = self.wip.take() {
            let freed = self.arena.free_tree(wip);
            log::trace!("discarded work in progress ({freed} fibers)");
        }
        self.next_unit = None;
        self.deletions.clear();
    }

    fn apply_pending_updates(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        if !self.updates.take() {
            return;
        }
        if self.wip.is_some() {
            cov_mark::hit!(state_update_restarts_pass);
            log::debug!("state update: restarting in-flight pass");
        } else {
            log::debug!("state update: scheduling pass");
        }
        self.discard_work_in_progress();

        let committed = &self.arena[current];
        let mut root = Fiber::new(committed.kind.clone(), Rc::clone(&committed.props));
        root.node = committed.node.clone();
        root.alternate = Some(current);
        let root = self.arena.insert(root);
        self.wip = Some(root);
        self.next_unit = Some(root);
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        let kind = self.arena[id].kind.clone();
        log::trace!("unit of work {:?} ({})", id, kind.label());
        match &kind {
            ElementType::Function(component) => {
                let element = self.render_component(id, component.name(), |props| component.call(props))?;
                reconcile_children(&mut self.arena, &mut self.deletions, id, &[element]);
            }
            ElementType::Class(component) => {
                let element = self.render_component(id, component.name(), |props| component.call(props))?;
                reconcile_children(&mut self.arena, &mut self.deletions, id, &[element]);
            }
            ElementType::Host(_) | ElementType::Text => {
                self.materialize(id)?;
                self.reconcile_props_children(id);
            }
            ElementType::Fragment => self.reconcile_props_children(id),
        }
        Ok(self.arena.next_unit(id))
    }

    fn reconcile_props_children(&mut self, id: FiberId) {
        let props = Rc::clone(&self.arena[id].props);
        reconcile_children(&mut self.arena, &mut self.deletions, id, props.children());
    }

    fn render_component(
        &mut self,
        id: FiberId,
        name: &str,
        render: impl FnOnce(&Props) -> Element,
    ) -> Result<Element> {
        let props = Rc::clone(&self.arena[id].props);
        let previous = self.arena[id].alternate.map(|alternate| self.arena[alternate].hooks.clone());
        let evaluating = self.updates.evaluating();
        let scope = RenderScope::enter(RenderFrame::new(name, previous, Rc::clone(&self.updates)));
        let element = render(&props);
        let outcome = scope.finish();
        drop(evaluating);
        self.arena[id].hooks = outcome.hooks;
        match outcome.violation {
            Some(violation) => Err(violation),
            None => Ok(element),
        }
    }

    fn materialize(&mut self, id: FiberId) -> Result<()> {
        let fiber = &self.arena[id];
        if fiber.node.is_some() {
            return Ok(());
        }
        let kind = match &fiber.kind {
            ElementType::Host(tag) => HostKind::Element(tag),
            ElementType::Text => HostKind::Text,
            _ => return Ok(()),
        };
        let node = self
            .host
            .materialize(kind, &fiber.props)
            .map_err(|err| Error::host("materialize", err))?;
        self.arena[id].node = Some(node);
        Ok(())
    }
}
