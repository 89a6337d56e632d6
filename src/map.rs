//! City layout data
//!
//! A city is a JSON document listing static shapes: roads, buildings,
//! trees, parked cars and grassy areas. Each record carries exactly one of
//! `vertices`, `circle` or `rect`. Unknown kinds are logged and skipped.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::error::LoadError;
use crate::sim::geometry::Shape;
use crate::sim::world::{Entity, EntityKind, World};

/// The city shipped with the game
const DEFAULT_CITY: &str = include_str!("../assets/city.json");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCircle {
    pub center: Vec2,
    pub radius: f32,
}

/// Axis-aligned rectangle by top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One static map record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapEntity {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Vec2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<MapCircle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<MapRect>,
    #[serde(default)]
    pub description: String,
    /// Scores a delivery when hit by a thrown item
    #[serde(default)]
    pub needs_item: bool,
}

impl MapEntity {
    /// Build the world-space shape, validating sizes
    pub fn shape(&self, index: usize) -> Result<Shape, LoadError> {
        if let Some(vertices) = &self.vertices {
            if vertices.len() < 3 {
                return Err(LoadError::TooFewVertices {
                    index,
                    description: self.description.clone(),
                    count: vertices.len(),
                });
            }
            return Ok(Shape::polygon(vertices.clone()));
        }
        if let Some(c) = self.circle {
            if c.radius <= 0.0 {
                return Err(self.non_positive(index));
            }
            return Ok(Shape::circle(c.center, c.radius));
        }
        if let Some(r) = self.rect {
            if r.width <= 0.0 || r.height <= 0.0 {
                return Err(self.non_positive(index));
            }
            return Ok(Shape::rect(Vec2::new(r.x, r.y), r.width, r.height));
        }
        Err(LoadError::MissingShape {
            index,
            description: self.description.clone(),
        })
    }

    fn non_positive(&self, index: usize) -> LoadError {
        LoadError::NonPositiveSize {
            index,
            description: self.description.clone(),
        }
    }

    /// Kinds a map may place. Projectiles and the rider are spawned by the game.
    fn placeable_kind(&self) -> Option<EntityKind> {
        match EntityKind::from_name(&self.kind)? {
            EntityKind::Projectile | EntityKind::Player => None,
            kind => Some(kind),
        }
    }
}

/// A city layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMap {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default)]
    pub entities: Vec<MapEntity>,
}

fn default_width() -> f32 {
    WORLD_WIDTH
}

fn default_height() -> f32 {
    WORLD_HEIGHT
}

impl Default for CityMap {
    /// An empty lot of the default size
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            entities: Vec::new(),
        }
    }
}

impl CityMap {
    /// Parse and validate a city document
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let map: CityMap = serde_json::from_str(json)?;
        map.validate()?;
        log::info!(
            "Loaded city {}x{} with {} records",
            map.width,
            map.height,
            map.entities.len()
        );
        Ok(map)
    }

    pub fn default_city() -> Result<Self, LoadError> {
        Self::from_json(DEFAULT_CITY)
    }

    /// Every placeable record must have a valid shape, and there must be a road
    pub fn validate(&self) -> Result<(), LoadError> {
        let mut roads = 0;
        for (index, record) in self.entities.iter().enumerate() {
            let Some(kind) = record.placeable_kind() else {
                continue;
            };
            record.shape(index)?;
            if kind == EntityKind::Road {
                roads += 1;
            }
        }
        if roads == 0 {
            return Err(LoadError::NoRoads);
        }
        Ok(())
    }

    /// Register every placeable record in `world`; returns how many were added
    pub fn populate(&self, world: &mut World) -> usize {
        let mut added = 0;
        for (index, record) in self.entities.iter().enumerate() {
            let Some(kind) = record.placeable_kind() else {
                log::warn!(
                    "Skipping map record {} ({}): unknown kind '{}'",
                    index,
                    record.description,
                    record.kind
                );
                continue;
            };
            let shape = match record.shape(index) {
                Ok(shape) => shape,
                Err(e) => {
                    log::warn!("Skipping map record: {}", e);
                    continue;
                }
            };
            world.add(
                Entity::new(kind, shape)
                    .with_needs_item(record.needs_item)
                    .with_description(record.description.clone()),
            );
            added += 1;
        }

        if added > 0 {
            let summary: Vec<String> = EntityKind::ALL
                .iter()
                .map(|&k| (k, world.count_of_kind(k)))
                .filter(|&(_, n)| n > 0)
                .map(|(k, n)| format!("{} {}", n, k.as_str()))
                .collect();
            log::info!("City populated: {}", summary.join(", "));
        }
        added
    }
}
