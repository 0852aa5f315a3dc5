//! Connectivity graph over resting bubbles
//!
//! An adjacency list keyed by [`BubbleId`]. Two bubbles share an edge iff
//! their gap (center distance minus one diameter) is within the connect
//! tolerance; overlapping bubbles are connected too. The relation is kept
//! symmetric under every mutation.
//!
//! All queries treat a missing id as "nothing there" and return an empty
//! set, `None`, or a sentinel instead of panicking. Nodes live in a
//! `BTreeMap`, so every traversal visits them in id order and results are
//! reproducible.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glam::Vec2;

use super::bubble::{Bubble, BubbleColor, BubbleId, BubblePower};
use super::collision::{backtrack_distance, segment_blocked_by};
use super::projectile::Projectile;
use crate::config::EngineConfig;
use crate::consts::*;

#[derive(Debug, Clone)]
struct Node {
    bubble: Bubble,
    neighbors: Vec<BubbleId>,
}

/// Who touches whom among resting bubbles
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    radius: f32,
    screen_height: f32,
    connect_tolerance: f32,
    ceiling_margin: f32,
    min_burst: usize,
    nodes: BTreeMap<BubbleId, Node>,
    next_id: u32,
}

impl ConnectivityGraph {
    pub fn new(radius: f32, screen_height: f32) -> Self {
        Self {
            radius,
            screen_height,
            connect_tolerance: CONNECT_TOLERANCE,
            ceiling_margin: CALCULATION_MARGIN,
            min_burst: MIN_BURST,
            nodes: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            connect_tolerance: config.connect_tolerance,
            ceiling_margin: config.calculation_margin,
            min_burst: config.min_burst,
            ..Self::new(config.bubble_radius, config.screen_height)
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.next_id = 0;
    }

    // === Accessors ===

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: BubbleId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.nodes.get(&id).map(|n| &n.bubble)
    }

    /// Neighbors of `id` (empty if absent)
    pub fn neighbors(&self, id: BubbleId) -> &[BubbleId] {
        self.nodes.get(&id).map(|n| n.neighbors.as_slice()).unwrap_or(&[])
    }

    /// Resident bubbles in id order
    pub fn iter(&self) -> impl Iterator<Item = (BubbleId, &Bubble)> + '_ {
        self.nodes.iter().map(|(&id, n)| (id, &n.bubble))
    }

    pub fn ids_with_power(&self, power: BubblePower) -> Vec<BubbleId> {
        self.iter()
            .filter(|(_, b)| b.power == power)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_target(&self) -> bool {
        self.iter().any(|(_, b)| b.is_target)
    }

    /// Colors still present on target bubbles
    pub fn target_colors(&self) -> BTreeSet<BubbleColor> {
        self.iter()
            .filter(|(_, b)| b.is_target && b.color.is_colored())
            .map(|(_, b)| b.color)
            .collect()
    }

    // === Construction ===

    /// Replace the graph with `bubbles`, linking every touching pair.
    ///
    /// Bubbles whose center is already taken are skipped. Returns the ids of
    /// the inserted bubbles in input order.
    pub fn build_graph(&mut self, bubbles: impl IntoIterator<Item = Bubble>) -> Vec<BubbleId> {
        self.clear();
        let mut ids = Vec::new();
        for bubble in bubbles {
            if self.center_taken(bubble.center) {
                log::warn!("Skipping duplicate bubble at {:?}", bubble.center);
                continue;
            }
            let id = self.allocate_id();
            self.nodes.insert(id, Node { bubble, neighbors: Vec::new() });
            ids.push(id);
        }

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                if self.connected(&self.nodes[&a].bubble, &self.nodes[&b].bubble) {
                    self.add_connection(a, b);
                }
            }
        }
        ids
    }

    /// Insert one bubble and link it to everything it touches.
    ///
    /// Returns `None` (graph unchanged) if a bubble already sits at that exact center.
    pub fn add_to_graph(&mut self, bubble: Bubble) -> Option<BubbleId> {
        if self.center_taken(bubble.center) {
            log::warn!("Refusing duplicate bubble at {:?}", bubble.center);
            return None;
        }
        let touching: Vec<BubbleId> = self
            .iter()
            .filter(|(_, other)| self.connected(other, &bubble))
            .map(|(id, _)| id)
            .collect();

        let id = self.allocate_id();
        self.nodes.insert(id, Node { bubble, neighbors: Vec::new() });
        for other in touching {
            self.add_connection(id, other);
        }
        Some(id)
    }

    /// Unlink and delete a bubble; returns it if it was present
    pub fn remove_bubble_from_graph(&mut self, id: BubbleId) -> Option<Bubble> {
        let node = self.nodes.remove(&id)?;
        for neighbor in &node.neighbors {
            if let Some(other) = self.nodes.get_mut(neighbor) {
                other.neighbors.retain(|&n| n != id);
            }
        }
        Some(node.bubble)
    }

    fn allocate_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn center_taken(&self, center: Vec2) -> bool {
        self.nodes.values().any(|n| n.bubble.center == center)
    }

    fn add_connection(&mut self, a: BubbleId, b: BubbleId) {
        if let Some(node) = self.nodes.get_mut(&a) {
            node.neighbors.push(b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.neighbors.push(a);
        }
    }

    // === Geometry queries ===

    /// Gap between two bubbles: center distance minus one diameter
    pub fn distance_between(&self, a: &Bubble, b: &Bubble) -> f32 {
        crate::gap(a.center, b.center, self.radius)
    }

    pub fn connected(&self, a: &Bubble, b: &Bubble) -> bool {
        self.distance_between(a, b) <= self.connect_tolerance
    }

    /// Most negative gap between `probe` and any overlapping bubble, or the
    /// screen height when nothing overlaps
    pub fn closest_distance_from_existing_bubble(&self, probe: &Bubble) -> f32 {
        self.iter()
            .map(|(_, b)| self.distance_between(b, probe))
            .filter(|&d| d <= 0.0)
            .fold(self.screen_height, f32::min)
    }

    /// The bubble `probe` overlaps the most, with its (non-positive) gap
    pub fn closest_collided_bubble_and_distance(&self, probe: &Bubble) -> Option<(BubbleId, f32)> {
        let mut closest: Option<(BubbleId, f32)> = None;
        for (id, bubble) in self.iter() {
            let distance = self.distance_between(bubble, probe);
            if distance <= 0.0 && closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((id, distance));
            }
        }
        closest
    }

    /// True if no resident bubble obstructs the straight line from `from` to `to`
    pub fn clear_path(&self, from: Vec2, to: Vec2) -> bool {
        !self
            .iter()
            .any(|(_, b)| segment_blocked_by(from, to, b.center, self.radius))
    }

    /// Move `projectile` back along its direction until it exactly touches `collided`.
    ///
    /// Returns false (projectile untouched) when `collided` is absent, the
    /// projectile has no direction, or no touching point lies behind it.
    pub fn backtrack_to_touching(&self, projectile: &mut Projectile, collided: BubbleId) -> bool {
        let Some(other) = self.get(collided) else {
            return false;
        };
        match backtrack_distance(projectile.center(), projectile.direction(), other.center, self.radius) {
            Some(dist) if dist >= 0.0 => {
                projectile.move_for_distance(-dist);
                true
            }
            _ => false,
        }
    }

    // === Burst / fall ===

    /// Same-color group containing `start`, if it is large enough to burst
    pub fn bursted_bubbles(&self, start: BubbleId) -> BTreeSet<BubbleId> {
        let Some(start_bubble) = self.get(start) else {
            return BTreeSet::new();
        };
        let color = start_bubble.color;
        if !color.is_colored() {
            return BTreeSet::new();
        }

        let mut group = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            for &neighbor in self.neighbors(id) {
                let same_class = self
                    .get(neighbor)
                    .is_some_and(|b| b.color == color && b.power == BubblePower::None);
                if same_class && group.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        if group.len() >= self.min_burst {
            group
        } else {
            BTreeSet::new()
        }
    }

    /// Everything removed by power bubbles activated by `start`, including chains.
    ///
    /// `start` and its direct neighbors are the initial triggers. A star
    /// neighbor clears every bubble of `start`'s color; bombs and lightning
    /// caught in a blast trigger in turn, each at most once. Indestructible
    /// bubbles are never included.
    pub fn bubbles_bursted_by_power(&self, start: BubbleId) -> BTreeSet<BubbleId> {
        if !self.contains(start) {
            return BTreeSet::new();
        }
        let mut bursted = self.bursted_by_star(start);

        let mut triggered = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        for &neighbor in self.neighbors(start) {
            if triggered.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }

        while let Some(id) = queue.pop_front() {
            let removed = self.bursted_by_lightning_or_bomb(id);
            for &other in &removed {
                let chains = self.get(other).is_some_and(|b| b.power.chains());
                if chains && triggered.insert(other) {
                    queue.push_back(other);
                }
            }
            bursted.extend(removed);
        }

        bursted.retain(|&id| self.get(id).is_some_and(Bubble::is_destructible));
        bursted
    }

    fn bursted_by_star(&self, activator: BubbleId) -> BTreeSet<BubbleId> {
        let Some(color) = self.get(activator).map(|b| b.color) else {
            return BTreeSet::new();
        };
        let stars: BTreeSet<BubbleId> = self
            .neighbors(activator)
            .iter()
            .copied()
            .filter(|&id| self.get(id).is_some_and(|b| b.power == BubblePower::Star))
            .collect();
        if stars.is_empty() || !color.is_colored() {
            return BTreeSet::new();
        }

        let mut bursted: BTreeSet<BubbleId> = self
            .iter()
            .filter(|(_, b)| b.color == color)
            .map(|(id, _)| id)
            .collect();
        bursted.extend(stars);
        bursted
    }

    fn bursted_by_lightning_or_bomb(&self, id: BubbleId) -> BTreeSet<BubbleId> {
        let Some(bubble) = self.get(id) else {
            return BTreeSet::new();
        };
        match bubble.power {
            BubblePower::Bomb => {
                let mut bursted: BTreeSet<BubbleId> = self.neighbors(id).iter().copied().collect();
                bursted.insert(id);
                bursted
            }
            BubblePower::Lightning => self.bubbles_in_row(bubble),
            _ => BTreeSet::new(),
        }
    }

    /// Bubbles whose center lies within one diameter below `bubble`'s top edge
    fn bubbles_in_row(&self, bubble: &Bubble) -> BTreeSet<BubbleId> {
        let top = bubble.top_y();
        let bottom = top + 2.0 * self.radius;
        self.iter()
            .filter(|(_, b)| b.center.y >= top && b.center.y <= bottom)
            .map(|(id, _)| id)
            .collect()
    }

    /// Bubbles left without a path to the ceiling once `bursted` is gone
    pub fn fell_bubbles(&self, bursted: &BTreeSet<BubbleId>) -> BTreeSet<BubbleId> {
        let mut removed = bursted.clone();
        let mut fell = BTreeSet::new();

        let seeds: BTreeSet<BubbleId> = bursted
            .iter()
            .flat_map(|&id| self.neighbors(id).iter().copied())
            .filter(|id| !bursted.contains(id))
            .collect();

        for seed in seeds {
            if removed.contains(&seed) {
                continue;
            }
            let unsupported = self.unsupported_from(seed, &removed);
            removed.extend(unsupported.iter().copied());
            fell.extend(unsupported);
        }
        fell
    }

    /// The component reachable from `start` avoiding `removed`, or nothing if
    /// any of it touches the ceiling
    fn unsupported_from(&self, start: BubbleId, removed: &BTreeSet<BubbleId>) -> BTreeSet<BubbleId> {
        let touches = |id: BubbleId| {
            self.get(id)
                .is_some_and(|b| b.touches_ceiling(self.ceiling_margin))
        };
        if touches(start) {
            return BTreeSet::new();
        }

        let mut component = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            for &neighbor in self.neighbors(id) {
                if removed.contains(&neighbor) || component.contains(&neighbor) {
                    continue;
                }
                if touches(neighbor) {
                    return BTreeSet::new();
                }
                component.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
        component
    }

    /// Edges match `connected` exactly and are symmetric
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|(&a, node)| {
            self.nodes.iter().filter(|(b, _)| **b != a).all(|(&b, other)| {
                let linked = node.neighbors.contains(&b);
                linked == other.neighbors.contains(&a)
                    && linked == self.connected(&node.bubble, &other.bubble)
            })
        })
    }
}
