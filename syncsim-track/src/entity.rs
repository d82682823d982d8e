// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Named parts of a simulation.
//!
//! The simulator, its schedule and each synchronisation algorithm own an
//! entity. The path of an entity (`top::syncwise::schedule`) is fixed when it
//! is created and is what log level filters are matched against.

use std::fmt;
use std::rc::Rc;

use crate::{Id, Tracker};

/// Access to the entity of an object.
pub trait GetEntity {
    /// Return the entity owned by this object.
    fn entity(&self) -> &Rc<Entity>;
}

/// Separator between the names that make up a path.
pub const PATH_SEPARATOR: &str = "::";

/// A simulation entity.
///
/// Every entity except the one built by [`toplevel`] has a parent.
pub struct Entity {
    /// Name of this entity within its parent.
    pub name: String,

    /// Names of every ancestor and this entity, joined by [`PATH_SEPARATOR`].
    pub path: String,

    /// Parent entity (`None` only at the top level).
    pub parent: Option<Rc<Entity>>,

    /// Identifier given by the tracker.
    pub id: Id,

    /// [`Tracker`] receiving the messages of this entity.
    pub tracker: Tracker,
}

impl Entity {
    /// Create a new entity below `parent`, sharing its tracker.
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let path = format!("{}{PATH_SEPARATOR}{name}", parent.path);
        let tracker = parent.tracker.clone();
        Self {
            name: name.to_string(),
            id: tracker.register(&path),
            path,
            parent: Some(parent.clone()),
            tracker,
        }
    }

    /// Number of ancestors above this entity.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |parent| parent.depth() + 1)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Create the top-level entity of a simulation.
pub fn toplevel(tracker: &Tracker, name: &str) -> Rc<Entity> {
    Rc::new(Entity {
        name: name.to_string(),
        path: name.to_string(),
        parent: None,
        id: tracker.register(name),
        tracker: tracker.clone(),
    })
}
