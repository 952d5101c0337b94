use crate::utils::handles::EntityId;
use glam::{Mat2, Vec2};
use serde::{Deserialize, Serialize};

/// Blueprint for a revolute (pin) joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevoluteJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub collide_connected: bool,
}

/// Blueprint for a rigid distance joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceJointDef {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub collide_connected: bool,
}

/// Blueprint consumed by `World::create_joint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JointDef {
    Revolute(RevoluteJointDef),
    Distance(DistanceJointDef),
}

impl JointDef {
    pub fn revolute(body_a: EntityId, body_b: EntityId, local_anchor_a: Vec2, local_anchor_b: Vec2) -> Self {
        JointDef::Revolute(RevoluteJointDef {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            collide_connected: false,
        })
    }

    pub fn distance(
        body_a: EntityId,
        body_b: EntityId,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        length: f32,
    ) -> Self {
        JointDef::Distance(DistanceJointDef {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            length,
            collide_connected: false,
        })
    }

    pub fn collide_connected(mut self, collide: bool) -> Self {
        match &mut self {
            JointDef::Revolute(def) => def.collide_connected = collide,
            JointDef::Distance(def) => def.collide_connected = collide,
        }
        self
    }

    pub fn body_a(&self) -> EntityId {
        match self {
            JointDef::Revolute(def) => def.body_a,
            JointDef::Distance(def) => def.body_a,
        }
    }

    pub fn body_b(&self) -> EntityId {
        match self {
            JointDef::Revolute(def) => def.body_b,
            JointDef::Distance(def) => def.body_b,
        }
    }

    pub fn collides_connected(&self) -> bool {
        match self {
            JointDef::Revolute(def) => def.collide_connected,
            JointDef::Distance(def) => def.collide_connected,
        }
    }
}

/// Point-to-point constraint holding two anchors together.
#[derive(Debug)]
pub struct RevoluteJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub(crate) impulse: Vec2,

    // Solver scratch, valid between init and the end of an island solve.
    pub(crate) index_a: usize,
    pub(crate) index_b: usize,
    pub(crate) local_center_a: Vec2,
    pub(crate) local_center_b: Vec2,
    pub(crate) inv_mass_a: f32,
    pub(crate) inv_mass_b: f32,
    pub(crate) inv_i_a: f32,
    pub(crate) inv_i_b: f32,
    pub(crate) r_a: Vec2,
    pub(crate) r_b: Vec2,
    pub(crate) mass: Mat2,
}

/// Axial constraint keeping two anchors at a fixed distance.
#[derive(Debug)]
pub struct DistanceJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub(crate) impulse: f32,

    pub(crate) index_a: usize,
    pub(crate) index_b: usize,
    pub(crate) local_center_a: Vec2,
    pub(crate) local_center_b: Vec2,
    pub(crate) inv_mass_a: f32,
    pub(crate) inv_mass_b: f32,
    pub(crate) inv_i_a: f32,
    pub(crate) inv_i_b: f32,
    pub(crate) r_a: Vec2,
    pub(crate) r_b: Vec2,
    pub(crate) u: Vec2,
    pub(crate) mass: f32,
}

/// Constraint-specific state of a joint.
#[derive(Debug)]
pub enum JointKind {
    Revolute(RevoluteJoint),
    Distance(DistanceJoint),
}

/// Bilateral constraint owned by the world.
#[derive(Debug)]
pub struct Joint {
    pub id: EntityId,
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub collide_connected: bool,
    pub(crate) island: bool,
    pub kind: JointKind,
}

impl Joint {
    pub fn from_def(id: EntityId, def: &JointDef) -> Self {
        let kind = match def {
            JointDef::Revolute(def) => JointKind::Revolute(RevoluteJoint {
                local_anchor_a: def.local_anchor_a,
                local_anchor_b: def.local_anchor_b,
                impulse: Vec2::ZERO,
                index_a: 0,
                index_b: 0,
                local_center_a: Vec2::ZERO,
                local_center_b: Vec2::ZERO,
                inv_mass_a: 0.0,
                inv_mass_b: 0.0,
                inv_i_a: 0.0,
                inv_i_b: 0.0,
                r_a: Vec2::ZERO,
                r_b: Vec2::ZERO,
                mass: Mat2::ZERO,
            }),
            JointDef::Distance(def) => JointKind::Distance(DistanceJoint {
                local_anchor_a: def.local_anchor_a,
                local_anchor_b: def.local_anchor_b,
                length: def.length,
                impulse: 0.0,
                index_a: 0,
                index_b: 0,
                local_center_a: Vec2::ZERO,
                local_center_b: Vec2::ZERO,
                inv_mass_a: 0.0,
                inv_mass_b: 0.0,
                inv_i_a: 0.0,
                inv_i_b: 0.0,
                r_a: Vec2::ZERO,
                r_b: Vec2::ZERO,
                u: Vec2::ZERO,
                mass: 0.0,
            }),
        };
        Self {
            id,
            body_a: def.body_a(),
            body_b: def.body_b(),
            collide_connected: def.collides_connected(),
            island: false,
            kind,
        }
    }

    /// The other endpoint, given one of the two.
    pub fn other_body(&self, body: EntityId) -> EntityId {
        if body == self.body_a {
            self.body_b
        } else {
            self.body_a
        }
    }
}
