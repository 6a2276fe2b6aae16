//! Contract between the reconciler and the host renderer.
//!
//! The reconciler never touches a visible tree itself. It asks the host to
//! create nodes while building the work-in-progress tree and to attach,
//! detach and update them during commit. Node handles are opaque to the core
//! and cloned freely, so they should be cheap handles (ids, `Rc`s).

use crate::props::Props;

/// What kind of host node to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostKind<'a> {
    /// A tagged element such as `div`.
    Element(&'a str),
    /// A text node; its content is the [`TEXT_PROP`](crate::TEXT_PROP) prop.
    Text,
}

/// A renderer materializing fibers into a host tree.
///
/// Every method may fail; failures propagate out of the work loop as
/// [`Error::Host`](crate::Error::Host) without retry.
pub trait HostRenderer {
    /// Handle to a host node.
    type Node: Clone;
    /// Renderer failure.
    type Error: std::error::Error + 'static;

    /// Create a detached node with `props` already applied.
    fn materialize(&mut self, kind: HostKind<'_>, props: &Props) -> Result<Self::Node, Self::Error>;

    /// Bring `node` from `previous` to `next` props.
    ///
    /// Props missing from `next` are cleared, `on`-prefixed handlers are
    /// unregistered and registered as listeners, everything else is set. Use
    /// [`prop_patches`](crate::prop_patches) to get this as a list of
    /// operations.
    fn apply_prop_diff(
        &mut self,
        node: &Self::Node,
        previous: &Props,
        next: &Props,
    ) -> Result<(), Self::Error>;

    /// Append `child` as the last child of `parent`.
    fn insert_node(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

    /// Detach `child` from `parent`.
    fn remove_node(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;
}
