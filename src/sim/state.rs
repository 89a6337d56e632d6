//! Game state and core simulation types
//!
//! Everything the tick mutates lives on `GameState`; the host reads it back
//! through accessors and drains `GameEvent`s for audio, effects and HUD.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::balance::{Balance, FallCause, FallThresholds};
use super::geometry::{Polygon, Rect, Shape};
use super::projectile::{self, HitOutcome, Projectile, ThrowError};
use super::resolve::{Resolution, SearchPattern};
use super::timer::{Countdown, Interval};
use super::world::{Entity, EntityId, EntityKind, Filter, KindSet, World};
use crate::consts::*;
use crate::map::CityMap;
use crate::polar_to_cartesian;
use crate::tuning::{FallPenalty, Tuning};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// The clock ran out
    GameOver,
}

/// Items carried by the rider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    count: u32,
    max: u32,
}

impl Inventory {
    pub fn new(count: u32, max: u32) -> Self {
        Self {
            count: count.min(max),
            max,
        }
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max
    }

    /// Remove one item; false if there was none
    pub fn take_one(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        true
    }

    /// Top up to max; false if already full
    pub fn refill(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.count = self.max;
        true
    }

    /// Apply a fall penalty; returns how many items were lost
    pub fn lose(&mut self, penalty: FallPenalty) -> u32 {
        let lost = match penalty {
            FallPenalty::DropAll => self.count,
            FallPenalty::DropOne => self.count.min(1),
        };
        self.count -= lost;
        lost
    }
}

/// Gameplay modifiers owned by the host (power-ups, cheats).
/// The simulation reads them but never changes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub infinite_items: bool,
    pub fall_thresholds: FallThresholds,
}

/// The rider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Heading (radians, 0 = +x)
    pub rotation: f32,
    pub velocity: Vec2,
    /// Forward speed accumulator, within [0, max momentum]
    pub momentum: f32,
    /// Reversing this frame; mirrors steering
    pub going_backward: bool,
    pub balance: Balance,
    /// Time since the last directional input
    pub idle_ms: f32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            momentum: 0.0,
            going_backward: false,
            balance: Balance::default(),
            idle_ms: 0.0,
        }
    }

    /// Unit vector along the heading
    #[inline]
    pub fn facing(&self) -> Vec2 {
        polar_to_cartesian(1.0, self.rotation)
    }

    /// Collision diamond, built fresh from the current heading
    pub fn collision_polygon(&self) -> Polygon {
        let along = self.facing() * PLAYER_HALF_LENGTH;
        let across = self.facing().perp() * PLAYER_HALF_WIDTH;
        Polygon::new(vec![
            self.pos + along,
            self.pos + across,
            self.pos - along,
            self.pos - across,
        ])
    }

    pub fn collision_shape(&self) -> Shape {
        Shape::Polygon(self.collision_polygon())
    }
}

/// Notifications for the host's audio, effects and HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ItemThrown { projectile: u32 },
    /// Throw attempted with an empty inventory
    OutOfItems,
    ProjectileHit {
        projectile: u32,
        entity: EntityId,
        outcome: HitOutcome,
    },
    /// Timed out or left the world
    ProjectileExpired { projectile: u32 },
    ScoreChanged { delta: i64, total: i64 },
    InventoryChanged { count: u32 },
    TimeBonus { ms: f32 },
    Fell { cause: FallCause, items_lost: u32 },
    /// Movement lock after a fall ended
    Recovered,
    PlayerBlink { visible: bool },
    HardCollision { entity: EntityId, kind: EntityKind },
    Refilled,
    DestinationReached { by_projectile: bool },
    GameOver { score: i64 },
}

/// What the pointer is over
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub needs_item: bool,
    pub description: String,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub modifiers: Modifiers,
    pub phase: GamePhase,
    pub world: World,
    pub world_size: Vec2,
    pub player: Player,
    pub inventory: Inventory,
    /// In flight, sorted by id
    pub projectiles: Vec<Projectile>,
    pub score: i64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Time left in the run
    pub clock: Countdown,
    pub pedestrian_clock: Interval,
    pub refill_zone: Option<EntityId>,
    pub destination: Option<EntityId>,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Build a run on `map`, spawning the refill zone, destination marker,
    /// patrol cars and pedestrians from `seed`.
    pub fn new(seed: u64, tuning: Tuning, map: &CityMap) -> Self {
        let mut world = World::new();
        map.populate(&mut world);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            modifiers: Modifiers::default(),
            phase: GamePhase::Playing,
            world,
            world_size: Vec2::new(map.width, map.height),
            player: Player::new(Vec2::new(PLAYER_START_X, PLAYER_START_Y)),
            inventory: Inventory::new(tuning.start_items, tuning.max_items),
            projectiles: Vec::new(),
            score: 0,
            time_ticks: 0,
            clock: Countdown::started(tuning.game_duration_ms),
            pedestrian_clock: Interval::new(tuning.pedestrian_tick_ms),
            refill_zone: None,
            destination: None,
            events: Vec::new(),
            next_id: 1,
            tuning,
        };

        state.refill_zone = Some(state.world.add(
            Entity::new(
                EntityKind::RefillZone,
                Shape::circle(Vec2::new(REFILL_X, REFILL_Y), REFILL_RADIUS),
            )
            .with_description("Refill zone"),
        ));
        state.spawn_destination();
        state.spawn_patrol_cars();
        state.spawn_pedestrians();

        log::info!(
            "New run (seed {}): {} entities, {} pedestrians, {} patrol cars",
            seed,
            state.world.len(),
            state.world.count_of_kind(EntityKind::Person),
            super::steering::patrol_vehicles(&state.world).len()
        );
        state
    }

    fn spawn_destination(&mut self) {
        let Some(point) = self.destination_spot(None) else {
            log::warn!("No road to place the destination marker on");
            return;
        };
        self.destination = Some(self.world.add(
            Entity::new(EntityKind::Destination, Shape::circle(point, DESTINATION_RADIUS))
                .with_description("Destination"),
        ));
    }

    fn spawn_patrol_cars(&mut self) {
        let attempts = self.tuning.placement_attempts;
        for n in 0..self.tuning.patrol_car_count {
            let Some((road, start)) = self.world.random_road_point(&mut self.rng, None, attempts)
            else {
                continue;
            };
            let Some((_, dest)) = self.world.random_road_point(&mut self.rng, Some(road), attempts)
            else {
                continue;
            };
            let body = Shape::Rectangle(Rect::centered(start, PATROL_CAR_WIDTH, PATROL_CAR_HEIGHT));
            self.world.add(
                Entity::new(EntityKind::Car, body)
                    .with_destination(dest)
                    .with_description(format!("Patrol car {}", n + 1)),
            );
        }
    }

    fn spawn_pedestrians(&mut self) {
        let sample = Shape::ellipse(Vec2::ZERO, PEDESTRIAN_WIDTH, PEDESTRIAN_HEIGHT);
        let solid = Filter::excluding(KindSet::PEDESTRIAN_PASSABLE);
        for n in 0..self.tuning.pedestrian_count {
            let Some(at) = self.random_free_point(&sample, &solid) else {
                log::debug!("No free spot for pedestrian {}", n + 1);
                continue;
            };
            let dest = self.random_world_point();
            self.world.add(
                Entity::new(EntityKind::Person, sample.centered_at(at))
                    .with_destination(dest)
                    .with_description(format!("Pedestrian {}", n + 1)),
            );
        }
    }

    fn random_world_point(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.random_range(0.0..self.world_size.x.max(1.0)),
            self.rng.random_range(0.0..self.world_size.y.max(1.0)),
        )
    }

    fn random_free_point(&mut self, sample: &Shape, filter: &Filter) -> Option<Vec2> {
        for _ in 0..self.tuning.placement_attempts {
            let p = self.random_world_point();
            if self.world.is_position_free(p, sample, filter) {
                return Some(p);
            }
        }
        None
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand queued events to the host
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn add_score(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }
        self.score += delta;
        self.emit(GameEvent::ScoreChanged {
            delta,
            total: self.score,
        });
    }

    pub fn add_time(&mut self, ms: f32) {
        if ms <= 0.0 || self.phase == GamePhase::GameOver {
            return;
        }
        self.clock.extend(ms);
        self.emit(GameEvent::TimeBonus { ms });
    }

    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn items(&self) -> u32 {
        self.inventory.count()
    }

    pub fn time_left_ms(&self) -> f32 {
        self.clock.remaining_ms()
    }

    /// False during blink-off frames after a fall
    pub fn player_visible(&self) -> bool {
        self.player.balance.visible()
    }

    /// Fraction of the rider's collision corners under tree cover
    pub fn player_shade(&self) -> f32 {
        let diamond = self.player.collision_polygon();
        self.world.coverage_ratio(diamond.points(), EntityKind::Tree)
    }

    /// First solid entity under the pointer, for the aim cursor
    pub fn hover_target(&self, point: Vec2) -> Option<HoverTarget> {
        let ground = KindSet::EMPTY
            .with(EntityKind::Road)
            .with(EntityKind::Grass);
        let id = self.world.entity_at(point, &Filter::excluding(ground))?;
        let e = self.world.get(id)?;
        Some(HoverTarget {
            entity: id,
            kind: e.kind(),
            needs_item: e.needs_item(),
            description: e.description().to_string(),
        })
    }

    /// Throw one item from the rider toward `target`
    pub fn throw_item(&mut self, target: Vec2) -> Result<u32, ThrowError> {
        let id = self.next_id;
        let thrown = projectile::throw(
            id,
            self.player.pos,
            self.player.velocity,
            target,
            &mut self.inventory,
            self.modifiers.infinite_items,
            &self.tuning,
            &mut self.rng,
        );
        match thrown {
            Ok(p) => {
                self.next_id += 1;
                self.projectiles.push(p);
                self.emit(GameEvent::ItemThrown { projectile: id });
                if !self.modifiers.infinite_items {
                    self.emit(GameEvent::InventoryChanged {
                        count: self.inventory.count(),
                    });
                }
                Ok(id)
            }
            Err(e) => {
                self.emit(GameEvent::OutOfItems);
                Err(e)
            }
        }
    }

    /// Knock the rider over. Collision falls are ignored inside the cooldown
    /// window; returns whether a fall happened.
    pub fn fall(&mut self, cause: FallCause) -> bool {
        if matches!(cause, FallCause::Collision(_)) && !self.player.balance.collision_fall_ready() {
            return false;
        }

        self.player.momentum = 0.0;
        self.player.velocity = Vec2::ZERO;
        self.player.balance.begin_fall(&self.tuning);
        let items_lost = self.inventory.lose(self.tuning.fall_penalty);

        log::info!("Rider fell ({:?}), lost {} items", cause, items_lost);
        self.emit(GameEvent::Fell { cause, items_lost });
        if items_lost > 0 {
            self.emit(GameEvent::InventoryChanged {
                count: self.inventory.count(),
            });
        }
        true
    }

    /// Top up the inventory at the refill zone
    pub fn refill(&mut self) {
        if self.inventory.refill() {
            self.emit(GameEvent::Refilled);
            self.emit(GameEvent::InventoryChanged {
                count: self.inventory.count(),
            });
        }
    }

    /// Score the destination marker and move it somewhere else
    pub fn reach_destination(&mut self, by_projectile: bool) {
        self.add_score(self.tuning.destination_score);
        self.add_time(self.tuning.delivery_time_bonus_ms);
        self.emit(GameEvent::DestinationReached { by_projectile });
        self.relocate_destination();
    }

    fn relocate_destination(&mut self) {
        let Some(id) = self.destination else {
            return;
        };
        let current_road = self
            .world
            .get(id)
            .and_then(|e| self.world.road_at(e.position()));
        match self.destination_spot(current_road) {
            Some(point) => self.world.set_position(id, point),
            None => log::debug!("No road spot clear of the rider for the destination marker"),
        }
    }

    /// Random road point whose marker circle stays clear of the rider
    fn destination_spot(&mut self, avoid: Option<EntityId>) -> Option<Vec2> {
        let rider = self.player.collision_shape();
        let attempts = self.tuning.placement_attempts;
        for _ in 0..attempts {
            let (_, point) = self.world.random_road_point(&mut self.rng, avoid, attempts)?;
            if !Shape::circle(point, DESTINATION_RADIUS).overlaps(&rider) {
                return Some(point);
            }
        }
        None
    }

    /// Score a projectile hit
    pub fn score_hit(&mut self, projectile: u32, entity: EntityId, outcome: HitOutcome) {
        self.emit(GameEvent::ProjectileHit {
            projectile,
            entity,
            outcome,
        });
        match outcome {
            HitOutcome::PedestrianServed => {
                self.add_score(self.tuning.pedestrian_score);
                self.add_time(self.tuning.delivery_time_bonus_ms);
            }
            HitOutcome::Delivered => {
                self.add_score(self.tuning.delivery_score);
                self.add_time(self.tuning.delivery_time_bonus_ms);
            }
            HitOutcome::Wasted => self.add_score(-self.tuning.wrong_delivery_penalty),
            HitOutcome::Destination => self.reach_destination(true),
        }
    }

    /// Move the rider to the nearest spot clear of solid shapes, stepping
    /// back against `travel` first. The rider never leaves the world.
    pub fn push_player_out(&mut self, travel: Vec2) -> Resolution {
        let shape = self.player.collision_shape();
        let filter = Filter::excluding(KindSet::PLAYER_PASSABLE);
        let pattern = SearchPattern::from_tuning(&self.tuning);
        let resolution = super::resolve::push_out(
            &self.world,
            &shape,
            self.player.pos,
            travel,
            self.tuning.collision_nudge,
            &filter,
            &pattern,
        );
        self.player.pos = resolution.position().clamp(Vec2::ZERO, self.world_size);
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::Polygon;

    fn quiet_tuning() -> Tuning {
        Tuning {
            pedestrian_count: 0,
            patrol_car_count: 0,
            ..Default::default()
        }
    }

    fn empty_state() -> GameState {
        GameState::new(7, quiet_tuning(), &CityMap::default())
    }

    #[test]
    fn test_new_state_defaults() {
        let state = empty_state();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.items(), 10);
        assert_eq!(state.score(), 0);
        assert_eq!(state.time_left_ms(), 120_000.0);
        assert!(state.refill_zone.is_some());
        // No roads, no destination
        assert!(state.destination.is_none());
    }

    #[test]
    fn test_spawns_npcs_clear_of_buildings() {
        let map = CityMap::default_city().expect("default city");
        let state = GameState::new(11, Tuning::default(), &map);
        let people = state.world.ids_of_kind(EntityKind::Person);
        assert!(!people.is_empty());
        let solid = Filter::excluding(KindSet::PEDESTRIAN_PASSABLE);
        for id in people {
            let e = state.world.get(id).expect("pedestrian");
            assert!(e.destination().is_some());
            assert!(state.world.first_overlapping(e.shape(), &solid.without(id)).is_none());
        }
        assert!(state.destination.is_some());
    }

    #[test]
    fn test_inventory_penalties() {
        let mut inv = Inventory::new(7, 20);
        assert_eq!(inv.lose(FallPenalty::DropOne), 1);
        assert_eq!(inv.count(), 6);
        assert_eq!(inv.lose(FallPenalty::DropAll), 6);
        assert_eq!(inv.lose(FallPenalty::DropOne), 0);
        assert!(inv.refill());
        assert!(!inv.refill());
        assert_eq!(inv.count(), 20);
    }

    #[test]
    fn test_collision_falls_respect_cooldown() {
        let mut state = empty_state();
        let cause = FallCause::Collision(EntityKind::Person);
        assert!(state.fall(cause));
        state.player.balance.advance(1000.0);
        assert!(!state.fall(cause));
        let falls = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::Fell { .. }))
            .count();
        assert_eq!(falls, 1);
        assert_eq!(state.player.balance.falls(), 1);
    }

    #[test]
    fn test_fall_drops_items() {
        let mut state = empty_state();
        state.player.momentum = 120.0;
        assert!(state.fall(FallCause::LostBalance));
        assert_eq!(state.items(), 0);
        assert_eq!(state.player.momentum, 0.0);
        assert!(state.player.balance.is_locked());
    }

    #[test]
    fn test_throw_and_out_of_items() {
        let mut state = empty_state();
        state.inventory = Inventory::new(1, 20);
        assert!(state.throw_item(Vec2::new(500.0, 100.0)).is_ok());
        assert_eq!(state.throw_item(Vec2::new(500.0, 100.0)), Err(ThrowError::OutOfItems));
        assert_eq!(state.projectiles.len(), 1);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::OutOfItems));
    }

    #[test]
    fn test_diamond_follows_heading() {
        let mut p = Player::new(Vec2::new(50.0, 50.0));
        p.rotation = std::f32::consts::FRAC_PI_2;
        let pts = p.collision_polygon().points().to_vec();
        assert!((pts[0] - Vec2::new(50.0, 70.0)).length() < 0.001);
        assert!((pts[2] - Vec2::new(50.0, 30.0)).length() < 0.001);
        assert!((p.collision_shape().anchor() - p.pos).length() < 0.001);
    }

    #[test]
    fn test_push_out_stays_inside_world() {
        let mut state = empty_state();
        // Wall hugging the left edge; the nearest free spot is off the map
        state.world.add(Entity::new(
            EntityKind::Building,
            Shape::Polygon(Polygon::from_rect(Vec2::new(5.0, 800.0), 300.0, 400.0)),
        ));
        state.player.pos = Vec2::new(10.0, 1000.0);
        let resolution = state.push_player_out(Vec2::ZERO);
        assert!(resolution.position().x < 0.0);
        assert_eq!(state.player.pos.x, 0.0);
        assert_eq!(state.player.pos.y, resolution.position().y);
    }

    #[test]
    fn test_shade_and_hover() {
        let mut state = empty_state();
        state.world.add(Entity::new(EntityKind::Tree, Shape::circle(Vec2::new(100.0, 100.0), 200.0)));
        assert_eq!(state.player_shade(), 1.0);

        let shop = state.world.add(
            Entity::new(
                EntityKind::Building,
                Shape::Polygon(Polygon::from_rect(Vec2::new(1000.0, 1000.0), 50.0, 50.0)),
            )
            .with_needs_item(true)
            .with_description("Comic shop"),
        );
        let hover = state.hover_target(Vec2::new(1020.0, 1020.0)).expect("hover");
        assert_eq!(hover.entity, shop);
        assert!(hover.needs_item);
        assert_eq!(hover.description, "Comic shop");
        assert!(state.hover_target(Vec2::new(5000.0, 5000.0)).is_none());
    }
}
