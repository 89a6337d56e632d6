//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity insertion order)
//! - No rendering or platform dependencies

pub mod balance;
pub mod geometry;
pub mod locomotion;
pub mod projectile;
pub mod resolve;
pub mod state;
pub mod steering;
pub mod tick;
pub mod timer;
pub mod world;

pub use balance::{Balance, BalanceState, FallCause, FallThresholds};
pub use geometry::{Circle, Ellipse, Polygon, Rect, Segment, Shape};
pub use locomotion::Controls;
pub use projectile::{HitOutcome, Projectile, ThrowError};
pub use resolve::{Resolution, SearchPattern, find_free_position, push_out};
pub use state::{GameEvent, GamePhase, GameState, HoverTarget, Inventory, Modifiers, Player};
pub use tick::{TickInput, tick};
pub use world::{Entity, EntityId, EntityKind, Filter, KindSet, World};
