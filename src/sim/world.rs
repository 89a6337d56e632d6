//! Spatial world registry
//!
//! Owns every world entity (roads, buildings, trees, cars, pedestrians, the
//! refill zone and the destination marker) and answers "what overlaps this
//! shape" queries. Entities are kept in insertion order, which is also the
//! order queries report hits in. The scan is linear; a city holds a few
//! hundred shapes at most.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Shape;

/// Stable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Road,
    Building,
    Tree,
    Car,
    Person,
    RefillZone,
    Destination,
    Grass,
    Projectile,
    Player,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Road,
        EntityKind::Building,
        EntityKind::Tree,
        EntityKind::Car,
        EntityKind::Person,
        EntityKind::RefillZone,
        EntityKind::Destination,
        EntityKind::Grass,
        EntityKind::Projectile,
        EntityKind::Player,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Road => "road",
            EntityKind::Building => "building",
            EntityKind::Tree => "tree",
            EntityKind::Car => "car",
            EntityKind::Person => "person",
            EntityKind::RefillZone => "refill_zone",
            EntityKind::Destination => "destination",
            EntityKind::Grass => "grass",
            EntityKind::Projectile => "projectile",
            EntityKind::Player => "player",
        }
    }

    /// Parse a map-data type name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "road" | "intersection" => Some(EntityKind::Road),
            "building" => Some(EntityKind::Building),
            "tree" => Some(EntityKind::Tree),
            "car" => Some(EntityKind::Car),
            "person" | "pedestrian" => Some(EntityKind::Person),
            "refill_zone" | "refill zone" => Some(EntityKind::RefillZone),
            "destination" => Some(EntityKind::Destination),
            "grass" | "grassy area" => Some(EntityKind::Grass),
            "projectile" => Some(EntityKind::Projectile),
            "player" => Some(EntityKind::Player),
            _ => None,
        }
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Small set of entity kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSet(u16);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    /// Shapes the player rides over or through without being pushed out
    pub const PLAYER_PASSABLE: KindSet = KindSet::EMPTY
        .with(EntityKind::Road)
        .with(EntityKind::Tree)
        .with(EntityKind::Grass)
        .with(EntityKind::RefillZone)
        .with(EntityKind::Destination);

    /// Shapes a thrown item flies over
    pub const PROJECTILE_PASSABLE: KindSet = KindSet::EMPTY
        .with(EntityKind::Road)
        .with(EntityKind::Tree)
        .with(EntityKind::Grass)
        .with(EntityKind::RefillZone);

    /// Shapes a pedestrian walks through
    pub const PEDESTRIAN_PASSABLE: KindSet = KindSet::PLAYER_PASSABLE;

    pub const fn with(self, kind: EntityKind) -> KindSet {
        KindSet(self.0 | kind.bit())
    }

    #[inline]
    pub const fn contains(&self, kind: EntityKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Every kind except those in `self`
    pub const fn complement(self) -> KindSet {
        KindSet(!self.0)
    }
}

/// Which entities a query ignores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub exclude_kinds: KindSet,
    /// The querying entity itself
    pub exclude_id: Option<EntityId>,
}

impl Filter {
    pub fn excluding(kinds: KindSet) -> Self {
        Self {
            exclude_kinds: kinds,
            exclude_id: None,
        }
    }

    /// Only entities of `kind`
    pub fn only(kind: EntityKind) -> Self {
        Self::excluding(KindSet::EMPTY.with(kind).complement())
    }

    pub fn without(mut self, id: EntityId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    #[inline]
    pub fn accepts(&self, entity: &Entity) -> bool {
        !self.exclude_kinds.contains(entity.kind) && self.exclude_id != Some(entity.id)
    }
}

/// A world object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    /// World-space shape; moves with `position`
    shape: Shape,
    position: Vec2,
    velocity: Vec2,
    destination: Option<Vec2>,
    /// Scores a delivery when hit by a thrown item
    needs_item: bool,
    /// Pedestrian already served
    has_item: bool,
    description: String,
}

impl Entity {
    pub fn new(kind: EntityKind, shape: Shape) -> Self {
        Self {
            id: EntityId(0),
            kind,
            position: shape.anchor(),
            shape,
            velocity: Vec2::ZERO,
            destination: None,
            needs_item: false,
            has_item: false,
            description: String::new(),
        }
    }

    pub fn with_destination(mut self, destination: Vec2) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_needs_item(mut self, needs_item: bool) -> Self {
        self.needs_item = needs_item;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[inline]
    pub fn destination(&self) -> Option<Vec2> {
        self.destination
    }

    #[inline]
    pub fn needs_item(&self) -> bool {
        self.needs_item
    }

    #[inline]
    pub fn has_item(&self) -> bool {
        self.has_item
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// A car with somewhere to go is a patrol vehicle; without, it is parked
    #[inline]
    pub fn is_patrol_vehicle(&self) -> bool {
        self.kind == EntityKind::Car && self.destination.is_some()
    }
}

/// The entity registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    /// Sorted by id (ids are handed out in increasing order)
    entities: Vec<Entity>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Register an entity and return its handle
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        debug_assert!(!entity.shape.is_degenerate(), "degenerate entity shape");
        self.next_id = self.next_id.max(1);
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.entities.push(entity);
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.index_of(id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|i| &self.entities[i])
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.index_of(id).map(move |i| &mut self.entities[i])
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.id)
            .collect()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    /// Every accepted entity whose shape overlaps `shape`, in insertion order
    pub fn query_overlapping(&self, shape: &Shape, filter: &Filter) -> Vec<EntityId> {
        self.overlapping(shape, filter).map(|e| e.id).collect()
    }

    /// First accepted entity overlapping `shape`
    pub fn first_overlapping(&self, shape: &Shape, filter: &Filter) -> Option<EntityId> {
        self.overlapping(shape, filter).map(|e| e.id).next()
    }

    fn overlapping<'a>(
        &'a self,
        shape: &'a Shape,
        filter: &'a Filter,
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .filter(move |e| filter.accepts(e) && shape.overlaps(&e.shape))
    }

    /// Would `sample`, re-centered on `point`, overlap nothing accepted by `filter`?
    pub fn is_position_free(&self, point: Vec2, sample: &Shape, filter: &Filter) -> bool {
        let candidate = sample.centered_at(point);
        self.overlapping(&candidate, filter).next().is_none()
    }

    /// Point lies inside any road
    pub fn is_on_road(&self, point: Vec2) -> bool {
        self.entities
            .iter()
            .any(|e| e.kind == EntityKind::Road && e.shape.contains_point(point))
    }

    /// First accepted entity containing `point`
    pub fn entity_at(&self, point: Vec2, filter: &Filter) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|e| filter.accepts(e) && e.shape.contains_point(point))
            .map(|e| e.id)
    }

    /// Fraction of `samples` lying inside some entity of `kind`
    pub fn coverage_ratio(&self, samples: &[Vec2], kind: EntityKind) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let covered = samples
            .iter()
            .filter(|&&p| {
                self.entities
                    .iter()
                    .any(|e| e.kind == kind && e.shape.contains_point(p))
            })
            .count();
        covered as f32 / samples.len() as f32
    }

    /// Move an entity (and its shape) to `position`
    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(e) = self.get_mut(id) {
            let delta = position - e.position;
            e.shape.translate(delta);
            e.position = position;
        }
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(e) = self.get_mut(id) {
            e.velocity = velocity;
        }
    }

    pub fn set_destination(&mut self, id: EntityId, destination: Option<Vec2>) {
        if let Some(e) = self.get_mut(id) {
            e.destination = destination;
        }
    }

    /// Mark a pedestrian served; returns false if it already was
    pub fn mark_served(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(e) if !e.has_item => {
                e.has_item = true;
                true
            }
            _ => false,
        }
    }

    /// Clear the needs-item flag; returns false if it was not set
    pub fn clear_needs_item(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(e) if e.needs_item => {
                e.needs_item = false;
                true
            }
            _ => false,
        }
    }

    /// Random point on a random road, preferring a road other than `avoid`
    pub fn random_road_point(
        &self,
        rng: &mut impl Rng,
        avoid: Option<EntityId>,
        attempts: u32,
    ) -> Option<(EntityId, Vec2)> {
        let roads = self.ids_of_kind(EntityKind::Road);
        let candidates: Vec<EntityId> = if roads.len() > 1 {
            roads.iter().copied().filter(|&id| Some(id) != avoid).collect()
        } else {
            roads
        };
        if candidates.is_empty() {
            return None;
        }
        let road_id = candidates[rng.random_range(0..candidates.len())];
        let road = self.get(road_id)?;
        random_point_in_shape(&road.shape, rng, attempts).map(|p| (road_id, p))
    }

    /// Road whose shape contains `point`
    pub fn road_at(&self, point: Vec2) -> Option<EntityId> {
        self.entity_at(point, &Filter::only(EntityKind::Road))
    }
}

/// Rejection-sample a point inside `shape` from its bounding box.
///
/// Gives up after `attempts` misses.
pub fn random_point_in_shape(shape: &Shape, rng: &mut impl Rng, attempts: u32) -> Option<Vec2> {
    let (min, max) = shape.to_polygon().bounds();
    if max.x <= min.x || max.y <= min.y {
        return None;
    }
    for _ in 0..attempts {
        let p = Vec2::new(rng.random_range(min.x..max.x), rng.random_range(min.y..max.y));
        if shape.contains_point(p) {
            return Some(p);
        }
    }
    log::debug!("Rejection sampling gave up after {} attempts", attempts);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::Polygon;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn road(origin: Vec2, w: f32, h: f32) -> Entity {
        Entity::new(EntityKind::Road, Shape::Polygon(Polygon::from_rect(origin, w, h)))
    }

    fn building(origin: Vec2, size: f32) -> Entity {
        Entity::new(
            EntityKind::Building,
            Shape::Polygon(Polygon::from_rect(origin, size, size)),
        )
    }

    #[test]
    fn test_query_respects_filter_and_order() {
        let mut world = World::new();
        let r = world.add(road(Vec2::ZERO, 200.0, 50.0));
        let b1 = world.add(building(Vec2::new(10.0, 10.0), 20.0));
        let b2 = world.add(building(Vec2::new(25.0, 10.0), 20.0));

        let probe = Shape::circle(Vec2::new(28.0, 20.0), 5.0);
        assert_eq!(world.query_overlapping(&probe, &Filter::default()), vec![r, b1, b2]);

        let solid = Filter::excluding(KindSet::PLAYER_PASSABLE);
        assert_eq!(world.query_overlapping(&probe, &solid), vec![b1, b2]);
        assert_eq!(world.first_overlapping(&probe, &solid.without(b1)), Some(b2));
    }

    #[test]
    fn test_is_position_free_recenters_sample() {
        let mut world = World::new();
        world.add(building(Vec2::new(100.0, 100.0), 50.0));
        let sample = Shape::circle(Vec2::ZERO, 5.0);
        let filter = Filter::default();
        assert!(!world.is_position_free(Vec2::new(125.0, 125.0), &sample, &filter));
        assert!(world.is_position_free(Vec2::new(20.0, 20.0), &sample, &filter));
    }

    #[test]
    fn test_is_on_road() {
        let mut world = World::new();
        world.add(road(Vec2::ZERO, 100.0, 20.0));
        world.add(building(Vec2::new(0.0, 40.0), 20.0));
        assert!(world.is_on_road(Vec2::new(50.0, 10.0)));
        assert!(!world.is_on_road(Vec2::new(10.0, 50.0)));
    }

    #[test]
    fn test_set_position_moves_shape() {
        let mut world = World::new();
        let id = world.add(Entity::new(
            EntityKind::Person,
            Shape::ellipse(Vec2::new(10.0, 10.0), 4.0, 6.0),
        ));
        world.set_position(id, Vec2::new(50.0, 60.0));
        let e = world.get(id).expect("entity");
        assert_eq!(e.position(), Vec2::new(50.0, 60.0));
        assert_eq!(e.shape().anchor(), Vec2::new(50.0, 60.0));
    }

    #[test]
    fn test_remove_keeps_lookup_working() {
        let mut world = World::new();
        let a = world.add(building(Vec2::ZERO, 10.0));
        let b = world.add(building(Vec2::new(20.0, 0.0), 10.0));
        let c = world.add(building(Vec2::new(40.0, 0.0), 10.0));
        assert!(world.remove(b).is_some());
        assert!(world.get(b).is_none());
        assert!(world.get(a).is_some());
        assert!(world.get(c).is_some());
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_served_and_needs_item_flags_flip_once() {
        let mut world = World::new();
        let p = world.add(Entity::new(EntityKind::Person, Shape::ellipse(Vec2::ZERO, 4.0, 4.0)));
        assert!(world.mark_served(p));
        assert!(!world.mark_served(p));

        let b = world.add(building(Vec2::new(20.0, 0.0), 10.0).with_needs_item(true));
        assert!(world.clear_needs_item(b));
        assert!(!world.clear_needs_item(b));
    }

    #[test]
    fn test_random_road_point_avoids_current_road() {
        let mut world = World::new();
        let a = world.add(road(Vec2::ZERO, 100.0, 20.0));
        let b = world.add(road(Vec2::new(0.0, 500.0), 100.0, 20.0));
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let (id, p) = world.random_road_point(&mut rng, Some(a), 100).expect("point");
            assert_eq!(id, b);
            assert!(world.get(b).expect("road").shape().contains_point(p));
        }
    }

    #[test]
    fn test_coverage_ratio() {
        let mut world = World::new();
        world.add(Entity::new(EntityKind::Tree, Shape::circle(Vec2::ZERO, 10.0)));
        let samples = [
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(50.0, 0.0),
            Vec2::new(0.0, 50.0),
        ];
        assert!((world.coverage_ratio(&samples, EntityKind::Tree) - 0.5).abs() < 0.001);
        assert_eq!(world.coverage_ratio(&samples, EntityKind::Building), 0.0);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::from_name("grassy area"), Some(EntityKind::Grass));
        assert_eq!(EntityKind::from_name("spaceship"), None);
    }
}
