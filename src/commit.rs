//! Applying a finished pass to the host.
//!
//! Commit is synchronous and never yields. Deletions are applied first, then
//! the work-in-progress tree is walked depth-first from the root's first child:
//! inserted fibers append their node to the nearest host ancestor, updated
//! fibers get their props diffed onto the node they inherited. Finally the
//! work-in-progress tree becomes the committed tree and the previous
//! generation is freed.

use crate::arena::{EffectTag, FiberId};
use crate::error::{Error, Result};
use crate::host::HostRenderer;
use crate::work_loop::Root;

#[derive(Debug, Default)]
struct CommitStats {
    removed: usize,
    inserted: usize,
    updated: usize,
}

impl<H: HostRenderer> Root<H> {
    pub(crate) fn commit_root(&mut self) -> Result<()> {
        let Some(wip) = self.wip else {
            return Ok(());
        };
        let mut stats = CommitStats::default();

        for deletion in std::mem::take(&mut self.deletions) {
            stats.removed += self.commit_deletion(deletion)?;
        }
        for id in self.arena.subtree(wip).into_iter().skip(1) {
            self.commit_work(id, &mut stats)?;
        }

        for id in self.arena.subtree(wip) {
            self.arena[id].alternate = None;
        }
        let mut freed = 0;
        for old in self.current.take().into_iter().chain(self.retired.take()) {
            freed += self.arena.free_tree(old);
        }
        self.current = Some(wip);
        self.wip = None;

        log::debug!(
            "commit: {} removed, {} inserted, {} updated, {freed} fibers freed",
            stats.removed,
            stats.inserted,
            stats.updated
        );
        Ok(())
    }

    /// Detach the host nodes of a deleted subtree. Returns how many nodes
    /// were removed.
    fn commit_deletion(&mut self, id: FiberId) -> Result<usize> {
        let Some(parent) = self.arena.host_parent(id) else {
            log::debug!("deleted fiber {id:?} has no host ancestor, nothing to remove");
            return Ok(0);
        };
        let roots = self.arena.host_roots(id);
        let Some(parent_node) = &self.arena[parent].node else {
            return Ok(0);
        };
        for root in &roots {
            if let Some(node) = &self.arena[*root].node {
                self.host
                    .remove_node(parent_node, node)
                    .map_err(|err| Error::host("remove_node", err))?;
            }
        }
        Ok(roots.len())
    }

    fn commit_work(&mut self, id: FiberId, stats: &mut CommitStats) -> Result<()> {
        let fiber = &self.arena[id];
        let Some(node) = &fiber.node else {
            return Ok(());
        };
        match fiber.effect_tag {
            EffectTag::Insert => {
                let Some(parent) = self.arena.host_parent(id) else {
                    log::debug!("inserted fiber {id:?} has no host ancestor");
                    return Ok(());
                };
                if let Some(parent_node) = &self.arena[parent].node {
                    self.host
                        .insert_node(parent_node, node)
                        .map_err(|err| Error::host("insert_node", err))?;
                    stats.inserted += 1;
                }
            }
            EffectTag::Update => {
                let Some(alternate) = fiber.alternate else {
                    return Ok(());
                };
                let previous = &self.arena[alternate].props;
                if previous.attrs_eq(&fiber.props) {
                    cov_mark::hit!(unchanged_props_skip_diff);
                    return Ok(());
                }
                self.host
                    .apply_prop_diff(node, previous, &fiber.props)
                    .map_err(|err| Error::host("apply_prop_diff", err))?;
                stats.updated += 1;
            }
            EffectTag::None | EffectTag::Delete => {}
        }
        Ok(())
    }
}
