use crate::collision::distance::test_overlap;
use crate::collision::narrowphase::{evaluate, Manifold};
use crate::core::body::Body;
use crate::core::fixture::Fixture;
use crate::utils::handles::{Arena, EntityId};

/// Touch transition reported by a manifold update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Begin,
    End,
}

/// Pairwise collision state between two fixtures.
#[derive(Debug)]
pub struct Contact {
    pub id: EntityId,
    pub fixture_a: EntityId,
    pub fixture_b: EntityId,
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub manifold: Manifold,
    pub friction: f32,
    pub restitution: f32,
    pub touching: bool,
    /// Cleared by listeners to suppress this contact's response for a step.
    pub enabled: bool,
    pub(crate) island: bool,
    /// Queued for a filter re-check on the next collide pass.
    pub(crate) filter_pending: bool,
    /// A bullet already resolved a TOI event against this contact this step.
    pub(crate) bullet_hit: bool,
    pub toi_count: u32,
}

impl Contact {
    /// Regenerates the manifold and reports a touch transition, if any.
    ///
    /// Sensor pairs get an overlap test instead of a manifold; accumulated
    /// impulses are carried over by feature id for warm starting.
    pub fn update(
        &mut self,
        bodies: &Arena<Body>,
        fixtures: &Arena<Fixture>,
    ) -> Option<TouchEvent> {
        // Re-enable by default; a listener may disable again during Begin.
        self.enabled = true;

        let fixture_a = fixtures.get(self.fixture_a)?;
        let fixture_b = fixtures.get(self.fixture_b)?;
        let body_a = bodies.get(self.body_a)?;
        let body_b = bodies.get(self.body_b)?;

        let was_touching = self.touching;
        let sensor = fixture_a.sensor || fixture_b.sensor;

        if sensor {
            self.touching = test_overlap(
                &fixture_a.shape,
                &body_a.transform,
                &fixture_b.shape,
                &body_b.transform,
            );
            self.manifold = Manifold::default();
        } else {
            let old_manifold = std::mem::take(&mut self.manifold);
            let mut manifold = evaluate(
                &fixture_a.shape,
                &body_a.transform,
                &fixture_b.shape,
                &body_b.transform,
            );
            manifold.inherit_impulses(&old_manifold);
            self.touching = !manifold.points.is_empty();
            self.manifold = manifold;
        }

        match (was_touching, self.touching) {
            (false, true) => Some(TouchEvent::Begin),
            (true, false) => Some(TouchEvent::End),
            _ => None,
        }
    }
}
