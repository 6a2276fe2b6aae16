// Fiber arena - storage for the work-unit trees of one root
//
// Both the committed tree and the work-in-progress tree live in the same slab.
// Links between fibers (parent, first child, next sibling, alternate) are
// FiberIds, so the trees can be walked and rewired without reference counting.
//
// Ownership rules:
// - parent/child/sibling links are owning: freeing a tree walks them
// - alternate is non-owning: it points into the previous generation, which is
//   freed after the next commit, at which point the links are cleared
//
// A FiberId is only meaningful for the arena that created it. Slab indices are
// reused after removal, so a stale id may alias a newer fiber; the root clears
// every alternate link before the generation it points into is freed.

use crate::element::ElementType;
use crate::hooks::Hook;
use crate::props::Props;
use slab::Slab;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

/// Identifier of a fiber inside its root's arena.
///
/// This is a zero-cost wrapper around a slab index.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FiberId(u32);

impl FiberId {
    /// Convert to usize for slab indexing
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Host mutation a fiber requires at commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EffectTag {
    /// Nothing to do (the root, and fibers not yet reconciled).
    #[default]
    None,
    /// Newly created: append the host node to its host parent.
    Insert,
    /// Same type as its alternate: diff props onto the existing host node.
    Update,
    /// Removed: detach from the host parent.
    Delete,
}

/// One unit of work: the processing state of one element for one pass.
#[derive(Debug)]
pub struct Fiber<N> {
    pub kind: ElementType,
    pub props: Rc<Props>,
    /// Host node owned by this fiber; only host and text fibers, and the
    /// root (holding the container), have one.
    pub node: Option<N>,
    pub alternate: Option<FiberId>,
    pub effect_tag: EffectTag,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub hooks: Vec<Hook>,
}

impl<N> Fiber<N> {
    /// Fresh fiber with no links.
    pub fn new(kind: ElementType, props: Rc<Props>) -> Self {
        Self {
            kind,
            props,
            node: None,
            alternate: None,
            effect_tag: EffectTag::None,
            parent: None,
            child: None,
            sibling: None,
            hooks: Vec::new(),
        }
    }
}

/// Slab of fibers for one root.
#[derive(Debug)]
pub struct FiberArena<N> {
    fibers: Slab<Fiber<N>>,
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self { fibers: Slab::new() }
    }
}

impl<N> FiberArena<N> {
    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        FiberId(self.fibers.insert(fiber) as u32)
    }

    /// Number of live fibers across all generations.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Next fiber in depth-first order after `id` has been processed.
    ///
    /// Prefers the first child; otherwise walks up through `parent` until a
    /// fiber with a sibling is found. `None` means the tree is exhausted.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self[id].child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = &self[current];
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Nearest ancestor of `id` owning a host node.
    pub fn host_parent(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self[id].parent;
        while let Some(current) = cursor {
            if self[current].node.is_some() {
                return Some(current);
            }
            cursor = self[current].parent;
        }
        None
    }

    /// Ids of `id` and its descendants in depth-first pre-order.
    ///
    /// Siblings of `id` are not included.
    pub fn subtree(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = Vec::new();
            let mut child = self[current].child;
            while let Some(c) = child {
                children.push(c);
                child = self[c].sibling;
            }
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Topmost fibers owning a host node within the subtree of `id`.
    ///
    /// For a host fiber this is the fiber itself; for a component or fragment
    /// it is the first host fiber along each branch below it.
    pub fn host_roots(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self[current].node.is_some() {
                out.push(current);
                continue;
            }
            let mut children = Vec::new();
            let mut child = self[current].child;
            while let Some(c) = child {
                children.push(c);
                child = self[c].sibling;
            }
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Remove `root` and all of its descendants. Returns how many were freed.
    pub fn free_tree(&mut self, root: FiberId) -> usize {
        let ids = self.subtree(root);
        for id in &ids {
            self.fibers.remove(id.index());
        }
        ids.len()
    }
}

impl<N> Index<FiberId> for FiberArena<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Self::Output {
        &self.fibers[id.index()]
    }
}

impl<N> IndexMut<FiberId> for FiberArena<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Self::Output {
        &mut self.fibers[id.index()]
    }
}
