use crate::callbacks::ContactFilter;
use crate::collision::broadphase::BroadPhase;
use crate::collision::narrowphase::Manifold;
use crate::collision::shapes::Shape;
use crate::core::body::{Body, ContactEdge};
use crate::core::fixture::{mix_friction, mix_restitution, Fixture};
use crate::core::joint::Joint;
use crate::dynamics::contact::{Contact, TouchEvent};
use crate::utils::handles::{Arena, EntityId};
use std::collections::HashMap;

/// Owns the contact graph: one contact per overlapping fixture pair.
#[derive(Default)]
pub struct ContactManager {
    pub contacts: Arena<Contact>,
    pairs: HashMap<(usize, usize), EntityId>,
}

impl ContactManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates contacts for broad-phase pairs that appeared since the last
    /// enumeration.
    pub fn find_new_contacts(
        &mut self,
        broad_phase: &mut BroadPhase,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        joints: &Arena<Joint>,
        filter: &mut dyn ContactFilter,
    ) {
        for (fixture_a, fixture_b) in broad_phase.moved_pairs() {
            self.add_pair(fixture_a, fixture_b, bodies, fixtures, joints, filter);
        }
    }

    fn add_pair(
        &mut self,
        fixture_a_id: EntityId,
        fixture_b_id: EntityId,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        joints: &Arena<Joint>,
        filter: &mut dyn ContactFilter,
    ) {
        let (fixture_a, fixture_b) = match (fixtures.get(fixture_a_id), fixtures.get(fixture_b_id))
        {
            (Some(a), Some(b)) => (a, b),
            _ => return,
        };
        if fixture_a.body == fixture_b.body {
            return;
        }
        if self.pairs.contains_key(&pair_key(fixture_a_id, fixture_b_id)) {
            return;
        }
        if !should_collide_bodies(bodies, joints, fixture_a.body, fixture_b.body) {
            return;
        }
        if !filter.should_collide(fixture_a, fixture_b) {
            return;
        }

        // The narrow phase expects polygon-vs-circle pairs polygon-first.
        let (fixture_a_id, fixture_b_id, fixture_a, fixture_b) = if matches!(
            (&fixture_a.shape, &fixture_b.shape),
            (Shape::Circle(_), Shape::Polygon(_))
        ) {
            (fixture_b_id, fixture_a_id, fixture_b, fixture_a)
        } else {
            (fixture_a_id, fixture_b_id, fixture_a, fixture_b)
        };

        let body_a = fixture_a.body;
        let body_b = fixture_b.body;
        let contact_id = self.contacts.insert(Contact {
            id: EntityId::default(),
            fixture_a: fixture_a_id,
            fixture_b: fixture_b_id,
            body_a,
            body_b,
            manifold: Manifold::default(),
            friction: mix_friction(fixture_a.friction, fixture_b.friction),
            restitution: mix_restitution(fixture_a.restitution, fixture_b.restitution),
            touching: false,
            enabled: true,
            island: false,
            filter_pending: false,
            bullet_hit: false,
            toi_count: 0,
        });
        if let Some(contact) = self.contacts.get_mut(contact_id) {
            contact.id = contact_id;
        }
        self.pairs
            .insert(pair_key(fixture_a_id, fixture_b_id), contact_id);

        if let Some(body) = bodies.get_mut(body_a) {
            body.contact_edges.push(ContactEdge {
                other: body_b,
                contact: contact_id,
            });
        }
        if let Some(body) = bodies.get_mut(body_b) {
            body.contact_edges.push(ContactEdge {
                other: body_a,
                contact: contact_id,
            });
        }
    }

    /// Removes a contact, unlinking it from both bodies. Returns the contact
    /// and whether it was touching (so the caller can announce the end).
    pub fn destroy(
        &mut self,
        contact_id: EntityId,
        bodies: &mut Arena<Body>,
    ) -> Option<(Contact, bool)> {
        let contact = self.contacts.remove(contact_id)?;
        self.pairs
            .remove(&pair_key(contact.fixture_a, contact.fixture_b));

        for body_id in [contact.body_a, contact.body_b] {
            if let Some(body) = bodies.get_mut(body_id) {
                body.contact_edges.retain(|edge| edge.contact != contact_id);
            }
        }
        let was_touching = contact.touching;
        Some((contact, was_touching))
    }

    /// Narrow-phase pass: refilters flagged contacts, culls pairs whose fat
    /// AABBs separated, updates manifolds. Touch transitions (including ends
    /// from destroyed contacts) are returned for the world to announce.
    pub fn collide(
        &mut self,
        broad_phase: &BroadPhase,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        joints: &Arena<Joint>,
        filter: &mut dyn ContactFilter,
    ) -> Vec<(EntityId, TouchEvent)> {
        let mut events = Vec::new();
        let contact_ids: Vec<EntityId> = self.contacts.ids().collect();

        for contact_id in contact_ids {
            let contact = match self.contacts.get_mut(contact_id) {
                Some(contact) => contact,
                None => continue,
            };
            let (body_a_id, body_b_id) = (contact.body_a, contact.body_b);
            let (fixture_a_id, fixture_b_id) = (contact.fixture_a, contact.fixture_b);

            if contact.filter_pending {
                contact.filter_pending = false;
                let keep = should_collide_bodies(bodies, joints, body_a_id, body_b_id)
                    && match (fixtures.get(fixture_a_id), fixtures.get(fixture_b_id)) {
                        (Some(a), Some(b)) => filter.should_collide(a, b),
                        _ => false,
                    };
                if !keep {
                    if let Some((_, was_touching)) = self.destroy(contact_id, bodies) {
                        if was_touching {
                            events.push((contact_id, TouchEvent::End));
                        }
                    }
                    continue;
                }
            }

            // Sleeping pairs keep their state untouched.
            let active_a = bodies
                .get(body_a_id)
                .is_some_and(|b| b.is_awake() && !b.is_static());
            let active_b = bodies
                .get(body_b_id)
                .is_some_and(|b| b.is_awake() && !b.is_static());
            if !active_a && !active_b {
                continue;
            }

            // Cull once the fat AABBs separate.
            let overlapping = match (
                fixtures.get(fixture_a_id).and_then(|f| f.proxy),
                fixtures.get(fixture_b_id).and_then(|f| f.proxy),
            ) {
                (Some(proxy_a), Some(proxy_b)) => broad_phase.overlap(proxy_a, proxy_b),
                _ => false,
            };
            if !overlapping {
                if let Some((_, was_touching)) = self.destroy(contact_id, bodies) {
                    if was_touching {
                        events.push((contact_id, TouchEvent::End));
                    }
                }
                continue;
            }

            if let Some(contact) = self.contacts.get_mut(contact_id) {
                if let Some(event) = contact.update(bodies, fixtures) {
                    events.push((contact_id, event));
                }
            }
        }
        events
    }

    /// Flags every contact between the two bodies for a filter re-check.
    pub fn flag_for_filtering(
        &mut self,
        bodies: &Arena<Body>,
        body_a: EntityId,
        body_b: EntityId,
    ) {
        let body = match bodies.get(body_b) {
            Some(body) => body,
            None => return,
        };
        for edge in &body.contact_edges {
            if edge.other != body_a {
                continue;
            }
            if let Some(contact) = self.contacts.get_mut(edge.contact) {
                contact.filter_pending = true;
            }
        }
    }
}

fn pair_key(fixture_a: EntityId, fixture_b: EntityId) -> (usize, usize) {
    if fixture_a.index() < fixture_b.index() {
        (fixture_a.index(), fixture_b.index())
    } else {
        (fixture_b.index(), fixture_a.index())
    }
}

/// Body-level collision veto: at least one endpoint must be dynamic, and no
/// connecting joint may suppress collision.
pub fn should_collide_bodies(
    bodies: &Arena<Body>,
    joints: &Arena<Joint>,
    body_a: EntityId,
    body_b: EntityId,
) -> bool {
    let (a, b) = match (bodies.get(body_a), bodies.get(body_b)) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    if !a.is_dynamic() && !b.is_dynamic() {
        return false;
    }
    for edge in &b.joint_edges {
        if edge.other != body_a {
            continue;
        }
        if let Some(joint) = joints.get(edge.joint) {
            if !joint.collide_connected {
                return false;
            }
        }
    }
    true
}
