//! Flat body arena and the deterministic per-frame stepping order.

use glam::Vec3;

use crate::body::{BodyParams, CelestialBody};

/// Handle to a body inside a [`SolarSystem`].
///
/// Ids are allocated in spawn order. Because a parent must exist before its
/// children can be spawned, a parent's id always sorts before theirs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

impl BodyId {
    /// Position of the body in the system's flat list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors from assembling a body hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("parent body id {parent} does not exist ({spawned} bodies spawned)")]
    UnknownParent { parent: usize, spawned: usize },
}

/// Ordered collection of celestial bodies forming an acyclic hierarchy.
///
/// Bodies are stored flat in spawn order. [`SolarSystem::step`] walks them in
/// that order, which is guaranteed to visit every parent before its children,
/// so a child always observes its parent's position for the current frame.
#[derive(Debug, Default)]
pub struct SolarSystem {
    bodies: Vec<CelestialBody>,
}

impl SolarSystem {
    /// Create an empty system.
    pub fn new() -> Self {
        Self { bodies: Vec::new() }
    }

    /// Add a body to the system.
    ///
    /// If `params.parent` is set it must refer to an already spawned body;
    /// this is what makes the flat iteration order a parent-before-child
    /// order.
    pub fn spawn(&mut self, params: &BodyParams) -> Result<BodyId, SystemError> {
        let parent_position = match params.parent {
            Some(parent) => {
                let body = self.bodies.get(parent.index()).ok_or(SystemError::UnknownParent {
                    parent: parent.index(),
                    spawned: self.bodies.len(),
                })?;
                Some(body.position())
            }
            None => None,
        };

        let id = BodyId(self.bodies.len());
        self.bodies.push(CelestialBody::new(params, parent_position));
        log::debug!(
            "Spawned body '{}' (id {}, parent {:?})",
            params.name,
            id.index(),
            params.parent.map(BodyId::index)
        );
        Ok(id)
    }

    /// Advance every body by one frame, in spawn order.
    ///
    /// Called exactly once per rendered frame. Each body reads its parent's
    /// position as of this frame (the parent was stepped earlier in the same
    /// pass), matching the incremental-displacement rule in
    /// [`CelestialBody::update`].
    pub fn step(&mut self) {
        for index in 0..self.bodies.len() {
            let parent_position = self.bodies[index]
                .parent()
                .map(|id| self.bodies[id.index()].position());
            self.bodies[index].update(parent_position);
        }
    }

    /// Borrow a body by id.
    pub fn body(&self, id: BodyId) -> &CelestialBody {
        &self.bodies[id.index()]
    }

    /// All bodies in spawn order.
    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    /// Current world position of a body.
    pub fn position(&self, id: BodyId) -> Vec3 {
        self.bodies[id.index()].position()
    }

    /// Find a body by display name.
    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|body| body.name() == name).map(BodyId)
    }

    /// Number of bodies in the system.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns `true` if no bodies have been spawned.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
