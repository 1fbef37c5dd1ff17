//! Dependency list construction
//!
//! One-time topological sort of the capability registry. The built list
//! puts leaves (capabilities nothing depends on, i.e. no children) first and
//! composite capabilities last: a node is emitted only once every one of its
//! children has been emitted. Adjustment and commit walk the list in
//! *application order*, the reverse, so a capability's declared parents
//! are always resolved and pushed before the capability itself.
//!
//! Construction also validates the graph: every declared child must be
//! registered and carry an adjust callback (otherwise change propagation
//! could not re-resolve it), and every parent an adjust callback declares
//! must list that capability among its children, which is what guarantees
//! the parent is ordered ahead of the reader in application order.

use std::collections::VecDeque;

use tracing::debug;

use crate::controls::registry::CapabilityTable;
use crate::controls::types::CapabilityId;
use crate::error::{Error, Result};

/// Cached topological order over a session's capabilities.
///
/// Built lazily, once per session, and immutable afterwards.
pub struct DependencyList {
    order: Vec<CapabilityId>,
}

impl DependencyList {
    /// Build the list for a populated registry.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidGraph`] when a template declaration is unsound, and
    /// [`Error::DependencyCycle`] (listing the unresolved ids) when the
    /// children relation is cyclic.
    pub fn build(table: &CapabilityTable) -> Result<Self> {
        validate_graph(table)?;

        // Kahn's algorithm over the reversed edges: a node becomes ready
        // once its unvisited-children counter drops to zero.
        let mut pending_children = [0usize; CapabilityId::COUNT];
        let mut parents_of: [Vec<CapabilityId>; CapabilityId::COUNT] =
            std::array::from_fn(|_| Vec::new());

        let mut queue: VecDeque<CapabilityId> = VecDeque::new();
        for cap in table.iter() {
            pending_children[cap.id.index()] = cap.children.len();
            for &child in cap.children {
                parents_of[child.index()].push(cap.id);
            }
            if cap.is_leaf() {
                queue.push_back(cap.id);
            }
        }

        let mut order = Vec::with_capacity(table.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &parent in &parents_of[id.index()] {
                let counter = &mut pending_children[parent.index()];
                *counter -= 1;
                if *counter == 0 {
                    queue.push_back(parent);
                }
            }
        }

        if order.len() != table.len() {
            let unresolved: Vec<CapabilityId> = table
                .iter()
                .map(|cap| cap.id)
                .filter(|id| !order.contains(id))
                .collect();
            return Err(Error::DependencyCycle(unresolved));
        }

        debug!(caps = order.len(), "dependency list prepared");
        Ok(Self { order })
    }

    /// The built order: children strictly before their parents.
    pub fn as_slice(&self) -> &[CapabilityId] {
        &self.order
    }

    /// Iterate in built order (leaves first).
    pub fn iter(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.order.iter().copied()
    }

    /// Iterate in application order (roots first): the order in which
    /// values are resolved and pushed to the device.
    pub fn application_order(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.order.iter().rev().copied()
    }

    /// Number of capabilities covered.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Template-soundness checks run before the sort.
fn validate_graph(table: &CapabilityTable) -> Result<()> {
    for cap in table.iter() {
        // A capability with no callbacks is a pure pass-through leaf; it
        // cannot drive propagation.
        if cap.adjust.is_none() && cap.commit.is_none() && cap.has_children() {
            return Err(Error::InvalidGraph(format!(
                "{} declares children but carries no callbacks",
                cap.id
            )));
        }

        for &child in cap.children {
            let child_cap = table.get(child).map_err(|_| {
                Error::InvalidGraph(format!(
                    "{} lists unregistered child {}",
                    cap.id, child
                ))
            })?;
            if child_cap.adjust.is_none() {
                return Err(Error::InvalidGraph(format!(
                    "child capability {} of {} has no adjust callback",
                    child, cap.id
                )));
            }
        }

        if let Some(op) = cap.adjust {
            for &parent in op.parents() {
                // Parents absent from this session's template are optional
                // inputs; registered parents must link back to the reader.
                let Ok(parent_cap) = table.get(parent) else {
                    continue;
                };
                if !parent_cap.children.contains(&cap.id) {
                    return Err(Error::InvalidGraph(format!(
                        "{} reads parent {} which does not list it as a child",
                        cap.id, parent
                    )));
                }
            }
        }
    }

    Ok(())
}
