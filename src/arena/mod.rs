// Arena-based storage for fibers
//
// Each Root owns one FiberArena holding both its committed tree and its
// work-in-progress tree. FiberId is a lightweight newtype indexing the slab.

pub mod fiber_arena;

pub use fiber_arena::{EffectTag, Fiber, FiberArena, FiberId};
