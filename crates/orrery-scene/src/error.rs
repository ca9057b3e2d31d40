//! Scene construction error types.

use crate::node::NodeId;

/// Errors raised while building or editing a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// Nodes must be named so they can be looked up.
    #[error("node name must not be empty")]
    EmptyName,

    /// Names index the graph and must be unique.
    #[error("node name '{0}' is already in use")]
    DuplicateName(String),

    /// The id does not belong to this graph.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Re-parenting is never implicit.
    #[error("node '{child}' already has parent '{parent}'")]
    AlreadyParented { child: String, parent: String },

    /// The attachment would make the tree cyclic (this includes attaching the root).
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    Cycle { child: String, parent: String },

    /// The attachment would push a node below the supported hierarchy depth.
    #[error("attaching '{child}' under '{parent}' exceeds the maximum depth of {max}")]
    TooDeep {
        child: String,
        parent: String,
        max: usize,
    },

    /// Only the graph itself creates the root.
    #[error("the root role is reserved for the scene root")]
    ReservedRole,

    /// A body in the scene description names a parent that does not exist (yet).
    #[error("body '{body}' names unknown parent '{parent}'")]
    UnknownParent { body: String, parent: String },
}
