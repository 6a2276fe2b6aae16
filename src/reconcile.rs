//! Positional child reconciliation.
//!
//! New elements are matched against the old child list by index only. A pair
//! with the same [`ElementType`](crate::ElementType) becomes an update that
//! keeps the old host node; anything else replaces: the old fiber is queued
//! for deletion and a fresh fiber is inserted. There are no keys, so moving
//! same-type siblings around replaces every shifted item.

use crate::arena::{EffectTag, Fiber, FiberArena, FiberId};
use crate::element::Element;
use crate::hooks::run_cleanups;

/// Build the next generation of children of `wip` from `elements`.
///
/// Old children are read from `wip`'s alternate. Fibers that have no
/// same-type counterpart are tagged [`EffectTag::Delete`], have their effect
/// cleanups run, and are appended to `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) {
    let mut old = arena[wip].alternate.and_then(|alternate| arena[alternate].child);
    let mut previous: Option<FiberId> = None;
    arena[wip].child = None;

    let mut index = 0;
    while index < elements.len() || old.is_some() {
        let element = elements.get(index);

        let same_type = match (old, element) {
            (Some(old), Some(element)) => arena[old].kind == *element.ty(),
            _ => false,
        };

        let created = match (element, old) {
            (Some(element), Some(old)) if same_type => Some(update_fiber(arena, wip, old, element)),
            (Some(element), _) => Some(insert_fiber(arena, wip, element)),
            (None, _) => None,
        };

        if !same_type {
            if let Some(old) = old {
                delete_fiber(arena, deletions, old);
            }
        }

        old = old.and_then(|old| arena[old].sibling);

        if let Some(created) = created {
            match previous {
                Some(previous) => arena[previous].sibling = Some(created),
                None => arena[wip].child = Some(created),
            }
            previous = Some(created);
        }

        index += 1;
    }
}

fn update_fiber<N: Clone>(
    arena: &mut FiberArena<N>,
    parent: FiberId,
    old: FiberId,
    element: &Element,
) -> FiberId {
    let node = arena[old].node.clone();
    let mut fiber = Fiber::new(element.ty().clone(), element.shared_props());
    fiber.node = node;
    fiber.alternate = Some(old);
    fiber.effect_tag = EffectTag::Update;
    fiber.parent = Some(parent);
    arena.insert(fiber)
}

fn insert_fiber<N>(arena: &mut FiberArena<N>, parent: FiberId, element: &Element) -> FiberId {
    let mut fiber = Fiber::new(element.ty().clone(), element.shared_props());
    fiber.effect_tag = EffectTag::Insert;
    fiber.parent = Some(parent);
    arena.insert(fiber)
}

/// Tag a committed fiber for removal and run the cleanups of its subtree.
///
/// The fiber's own effect cleanups run first, in hook index order, followed
/// by those of its descendants in depth-first order.
pub(crate) fn delete_fiber<N>(arena: &mut FiberArena<N>, deletions: &mut Vec<FiberId>, old: FiberId) {
    arena[old].effect_tag = EffectTag::Delete;
    let mut cleanups = 0;
    for id in arena.subtree(old) {
        cleanups += run_cleanups(&arena[id].hooks);
    }
    log::trace!(
        "scheduled deletion of {:?} ({}), {cleanups} cleanups run",
        old,
        arena[old].kind.label()
    );
    deletions.push(old);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::props::Props;
    use std::rc::Rc;

    fn committed(arena: &mut FiberArena<u32>, tags: &[&str]) -> FiberId {
        let root = arena.insert(Fiber::new(ElementType::Fragment, Rc::new(Props::new())));
        let mut previous: Option<FiberId> = None;
        for (i, tag) in tags.iter().enumerate() {
            let mut fiber = Fiber::new(ElementType::Host((*tag).into()), Rc::new(Props::new()));
            fiber.node = Some(i as u32);
            fiber.parent = Some(root);
            let id = arena.insert(fiber);
            match previous {
                Some(p) => arena[p].sibling = Some(id),
                None => arena[root].child = Some(id),
            }
            previous = Some(id);
        }
        root
    }

    fn wip_for(arena: &mut FiberArena<u32>, current: FiberId) -> FiberId {
        let mut fiber = Fiber::new(ElementType::Fragment, Rc::new(Props::new()));
        fiber.alternate = Some(current);
        arena.insert(fiber)
    }

    fn children(arena: &FiberArena<u32>, id: FiberId) -> Vec<(String, EffectTag, Option<u32>)> {
        let mut out = Vec::new();
        let mut child = arena[id].child;
        while let Some(c) = child {
            let fiber = &arena[c];
            out.push((fiber.kind.label().to_owned(), fiber.effect_tag, fiber.node));
            child = fiber.sibling;
        }
        out
    }

    #[test]
    fn first_pass_inserts_everything() {
        let mut arena = FiberArena::<u32>::default();
        let mut deletions = Vec::new();
        let root = arena.insert(Fiber::new(ElementType::Fragment, Rc::new(Props::new())));
        reconcile_children(
            &mut arena,
            &mut deletions,
            root,
            &[Element::host("a"), Element::text("b")],
        );
        assert_eq!(
            children(&arena, root),
            vec![
                ("a".to_owned(), EffectTag::Insert, None),
                ("#text".to_owned(), EffectTag::Insert, None),
            ]
        );
        assert!(deletions.is_empty());
    }

    #[test]
    fn same_type_keeps_node_and_links_alternate() {
        let mut arena = FiberArena::<u32>::default();
        let mut deletions = Vec::new();
        let current = committed(&mut arena, &["div", "span"]);
        let wip = wip_for(&mut arena, current);
        reconcile_children(
            &mut arena,
            &mut deletions,
            wip,
            &[Element::host("div"), Element::host("p")],
        );
        assert_eq!(
            children(&arena, wip),
            vec![
                ("div".to_owned(), EffectTag::Update, Some(0)),
                ("p".to_owned(), EffectTag::Insert, None),
            ]
        );
        let first = arena[wip].child.unwrap();
        assert_eq!(arena[first].alternate, arena[current].child);
        assert_eq!(deletions.len(), 1);
        assert_eq!(arena[deletions[0]].effect_tag, EffectTag::Delete);
        assert_eq!(arena[deletions[0]].kind.label(), "span");
    }

    #[test]
    fn shrinking_list_deletes_trailing_children() {
        let mut arena = FiberArena::<u32>::default();
        let mut deletions = Vec::new();
        let current = committed(&mut arena, &["li", "li", "li"]);
        let wip = wip_for(&mut arena, current);
        reconcile_children(&mut arena, &mut deletions, wip, &[Element::host("li")]);
        assert_eq!(children(&arena, wip).len(), 1);
        let deleted: Vec<_> = deletions.iter().map(|d| arena[*d].node).collect();
        assert_eq!(deleted, vec![Some(1), Some(2)]);
    }

    #[test]
    fn empty_children_clear_child_link() {
        let mut arena = FiberArena::<u32>::default();
        let mut deletions = Vec::new();
        let current = committed(&mut arena, &["li"]);
        let wip = wip_for(&mut arena, current);
        reconcile_children(&mut arena, &mut deletions, wip, &[]);
        assert_eq!(arena[wip].child, None);
        assert_eq!(deletions.len(), 1);
    }
}
