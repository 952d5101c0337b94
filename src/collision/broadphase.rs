use crate::collision::shapes::{Aabb, RayCastInput};
use crate::config::{AABB_EXTENSION, AABB_MULTIPLIER, BROADPHASE_CELL_SIZE};
use crate::utils::handles::{Arena, EntityId};
use glam::Vec2;
use std::collections::{HashMap, HashSet};

/// Broad-phase entry tying a fat AABB to its owning fixture.
#[derive(Debug, Clone)]
pub struct Proxy {
    pub aabb: Aabb,
    pub fixture: EntityId,
}

/// Uniform-grid broad phase over fattened proxy AABBs.
///
/// Pairs are reported only for proxies that moved since the previous
/// enumeration, so resting scenes cost little.
pub struct BroadPhase {
    cell_size: f32,
    proxies: Arena<Proxy>,
    grid: HashMap<(i32, i32), Vec<EntityId>>,
    moved: Vec<EntityId>,
}

impl Default for BroadPhase {
    fn default() -> Self {
        Self::new(BROADPHASE_CELL_SIZE)
    }
}

impl BroadPhase {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            proxies: Arena::new(),
            grid: HashMap::new(),
            moved: Vec::new(),
        }
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    pub fn create_proxy(&mut self, aabb: Aabb, fixture: EntityId) -> EntityId {
        let fat = aabb.extended(AABB_EXTENSION);
        let id = self.proxies.insert(Proxy { aabb: fat, fixture });
        self.moved.push(id);
        id
    }

    pub fn destroy_proxy(&mut self, id: EntityId) {
        self.proxies.remove(id);
        self.moved.retain(|m| *m != id);
    }

    /// Updates a proxy for a new tight AABB. The fat AABB only moves when the
    /// shape escapes it, with the displacement folded in as prediction.
    pub fn move_proxy(&mut self, id: EntityId, aabb: Aabb, displacement: Vec2) {
        let proxy = match self.proxies.get_mut(id) {
            Some(proxy) => proxy,
            None => return,
        };
        if proxy.aabb.contains(&aabb) {
            return;
        }

        let mut fat = aabb.extended(AABB_EXTENSION);
        let d = AABB_MULTIPLIER * displacement;
        if d.x < 0.0 {
            fat.lower.x += d.x;
        } else {
            fat.upper.x += d.x;
        }
        if d.y < 0.0 {
            fat.lower.y += d.y;
        } else {
            fat.upper.y += d.y;
        }
        proxy.aabb = fat;
        self.moved.push(id);
    }

    /// Re-queues a proxy for pair enumeration without moving it.
    pub fn touch_proxy(&mut self, id: EntityId) {
        if self.proxies.get(id).is_some() {
            self.moved.push(id);
        }
    }

    pub fn fat_aabb(&self, id: EntityId) -> Option<&Aabb> {
        self.proxies.get(id).map(|p| &p.aabb)
    }

    pub fn fixture_of(&self, id: EntityId) -> Option<EntityId> {
        self.proxies.get(id).map(|p| p.fixture)
    }

    pub fn overlap(&self, a: EntityId, b: EntityId) -> bool {
        match (self.proxies.get(a), self.proxies.get(b)) {
            (Some(pa), Some(pb)) => pa.aabb.overlaps(&pb.aabb),
            _ => false,
        }
    }

    /// Enumerates candidate fixture pairs involving proxies moved since the
    /// last call, then drains the move buffer.
    pub fn moved_pairs(&mut self) -> Vec<(EntityId, EntityId)> {
        self.rebuild_grid();

        let mut pairs = Vec::new();
        let mut checked = HashSet::new();

        for moved_id in &self.moved {
            let proxy = match self.proxies.get(*moved_id) {
                Some(proxy) => proxy,
                None => continue,
            };
            for other_id in self.cell_candidates(&proxy.aabb) {
                if other_id == *moved_id {
                    continue;
                }
                let other = match self.proxies.get(other_id) {
                    Some(other) => other,
                    None => continue,
                };
                if !proxy.aabb.overlaps(&other.aabb) {
                    continue;
                }
                let key = if moved_id.index() < other_id.index() {
                    (moved_id.index(), other_id.index())
                } else {
                    (other_id.index(), moved_id.index())
                };
                if checked.insert(key) {
                    pairs.push((proxy.fixture, other.fixture));
                }
            }
        }

        self.moved.clear();
        pairs
    }

    /// Invokes `callback(fixture_id)` for every proxy overlapping `aabb`;
    /// returning false stops the query.
    pub fn query<F>(&self, aabb: &Aabb, mut callback: F)
    where
        F: FnMut(EntityId) -> bool,
    {
        for (_, proxy) in self.proxies.iter() {
            if proxy.aabb.overlaps(aabb) && !callback(proxy.fixture) {
                return;
            }
        }
    }

    /// Walks proxies along a ray. The callback receives the current clip
    /// fraction and the fixture, and returns the new clip fraction (0 stops).
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(f32, EntityId) -> f32,
    {
        let mut max_fraction = input.max_fraction;
        for (_, proxy) in self.proxies.iter() {
            let segment = Aabb {
                lower: input.p1.min(input.p1 + max_fraction * (input.p2 - input.p1)),
                upper: input.p1.max(input.p1 + max_fraction * (input.p2 - input.p1)),
            };
            if !proxy.aabb.overlaps(&segment) {
                continue;
            }
            if !segment_hits_aabb(input.p1, input.p2, max_fraction, &proxy.aabb) {
                continue;
            }
            max_fraction = callback(max_fraction, proxy.fixture);
            if max_fraction == 0.0 {
                return;
            }
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (id, proxy) in self.proxies.iter() {
            let (min_cell, max_cell) = self.cell_range(&proxy.aabb);
            for x in min_cell.0..=max_cell.0 {
                for y in min_cell.1..=max_cell.1 {
                    self.grid.entry((x, y)).or_default().push(id);
                }
            }
        }
    }

    fn cell_range(&self, aabb: &Aabb) -> ((i32, i32), (i32, i32)) {
        (
            (
                (aabb.lower.x / self.cell_size).floor() as i32,
                (aabb.lower.y / self.cell_size).floor() as i32,
            ),
            (
                (aabb.upper.x / self.cell_size).floor() as i32,
                (aabb.upper.y / self.cell_size).floor() as i32,
            ),
        )
    }

    fn cell_candidates(&self, aabb: &Aabb) -> Vec<EntityId> {
        let mut results = Vec::new();
        let (min_cell, max_cell) = self.cell_range(aabb);
        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                if let Some(ids) = self.grid.get(&(x, y)) {
                    results.extend(ids.iter().copied());
                }
            }
        }
        results.sort();
        results.dedup();
        results
    }
}

/// Slab test of a clipped segment against an AABB.
fn segment_hits_aabb(p1: Vec2, p2: Vec2, max_fraction: f32, aabb: &Aabb) -> bool {
    let d = p2 - p1;
    let mut t_min = 0.0_f32;
    let mut t_max = max_fraction;

    for axis in 0..2 {
        let (origin, dir, lower, upper) = match axis {
            0 => (p1.x, d.x, aabb.lower.x, aabb.upper.x),
            _ => (p1.y, d.y, aabb.lower.y, aabb.upper.y),
        };
        if dir.abs() < f32::EPSILON {
            if origin < lower || origin > upper {
                return false;
            }
        } else {
            let inv = 1.0 / dir;
            let mut t1 = (lower - origin) * inv;
            let mut t2 = (upper - origin) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aabb(x0: f32, y0: f32, x1: f32, y1: f32) -> Aabb {
        Aabb::new(Vec2::new(x0, y0), Vec2::new(x1, y1))
    }

    #[test]
    fn moved_pairs_reports_overlaps_once() {
        let mut bp = BroadPhase::default();
        let fa = EntityId::new(0, 0);
        let fb = EntityId::new(1, 0);
        bp.create_proxy(aabb(0.0, 0.0, 1.0, 1.0), fa);
        bp.create_proxy(aabb(0.5, 0.5, 1.5, 1.5), fb);

        let pairs = bp.moved_pairs();
        assert_eq!(pairs.len(), 1);
        // Buffer drained; resting proxies produce nothing.
        assert!(bp.moved_pairs().is_empty());
    }

    #[test]
    fn small_motion_keeps_fat_aabb() {
        let mut bp = BroadPhase::default();
        let id = bp.create_proxy(aabb(0.0, 0.0, 1.0, 1.0), EntityId::new(0, 0));
        bp.moved_pairs();

        bp.move_proxy(id, aabb(0.01, 0.0, 1.01, 1.0), Vec2::new(0.01, 0.0));
        assert!(bp.moved_pairs().is_empty());
    }

    #[test]
    fn query_stops_when_asked() {
        let mut bp = BroadPhase::default();
        bp.create_proxy(aabb(0.0, 0.0, 1.0, 1.0), EntityId::new(0, 0));
        bp.create_proxy(aabb(0.2, 0.2, 0.8, 0.8), EntityId::new(1, 0));

        let mut seen = 0;
        bp.query(&aabb(0.0, 0.0, 2.0, 2.0), |_| {
            seen += 1;
            false
        });
        assert_eq!(seen, 1);
    }

    #[test]
    fn ray_skips_offline_proxies() {
        let mut bp = BroadPhase::default();
        bp.create_proxy(aabb(4.0, -1.0, 6.0, 1.0), EntityId::new(0, 0));
        bp.create_proxy(aabb(4.0, 10.0, 6.0, 12.0), EntityId::new(1, 0));

        let mut hits = Vec::new();
        bp.ray_cast(
            &RayCastInput {
                p1: Vec2::new(0.0, 0.0),
                p2: Vec2::new(10.0, 0.0),
                max_fraction: 1.0,
            },
            |fraction, fixture| {
                hits.push(fixture);
                fraction
            },
        );
        assert_eq!(hits.len(), 1);
    }
}
