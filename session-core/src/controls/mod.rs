//! Capability control framework
//!
//! Everything a session needs to negotiate its control surface:
//!
//! - **Types**: capability records, identifiers, flags, and the bitset used
//!   for per-pass bookkeeping
//! - **Registry**: the static-per-session capability table
//! - **Dependency list**: one-time topological ordering with cycle
//!   detection and build-time graph validation
//! - **Adjustment**: full-graph (pre-streaming) and incremental
//!   (post-streaming) value resolution
//! - **Commit**: dependency-ordered draining of pending device pushes
//! - **Query**: the enumerable, serializable control surface

pub mod adjust;
pub mod commit;
pub mod deplist;
pub mod query;
pub mod registry;
pub mod types;

pub use adjust::{AdjustCtx, AdjustOp};
pub use commit::{CommitCtx, CommitOp};
pub use deplist::DependencyList;
pub use query::{ControlDescriptor, ControlKind};
pub use registry::CapabilityTable;
pub use types::{
    Capability, CapabilityFlags, CapabilityId, CapabilitySet, Codec, Domain, SessionInfo,
};
