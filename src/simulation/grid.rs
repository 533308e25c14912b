//! Road grid queries
//!
//! The grid is an ordered list of vertical road axes (x positions, left to
//! right), horizontal road axes (y positions, top to bottom), the world
//! bounds and the emergency facilities. Vehicles consume it read-only.

use anyhow::{ensure, Result};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;

use super::types::{Position, Rect, VehicleClass, ROAD_WIDTH};

/// Preferred spacing between two parallel roads
pub const TARGET_BLOCK_SIZE: f32 = 220.0;

/// Side length of a facility footprint
pub const FACILITY_SIZE: f32 = 50.0;

/// Inset of a fire candidate from the block corner
pub const FIRE_CORNER_PAD: f32 = 20.0;

/// Minimum block extent for a fire to be placed in it
pub const MIN_BLOCK_EXTENT: f32 = 20.0;

/// Upper limit on the roads generated along one direction of a regular grid
pub const MAX_ROADS_PER_DIRECTION: usize = 1000;

/// Returns the axis closest to `value`.
/// Ties resolve to the first axis in the list; an empty list returns `value`.
pub fn nearest_axis(value: f32, axes: &[f32]) -> f32 {
    axes.iter()
        .copied()
        .min_by_key(|axis| OrderedFloat((value - axis).abs()))
        .unwrap_or(value)
}

fn ensure_valid_bounds(bounds: &Rect) -> Result<()> {
    ensure!(
        [bounds.x, bounds.y, bounds.width, bounds.height]
            .iter()
            .all(|v| v.is_finite()),
        "world bounds must be finite, got {:?}",
        bounds
    );
    ensure!(
        bounds.width > 0.0 && bounds.height > 0.0,
        "world bounds must have a positive extent, got {:?}",
        bounds
    );
    Ok(())
}

/// An emergency facility (police station, hospital, fire station)
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub class: VehicleClass,
    pub bounding_box: Rect,
    /// Point on the nearest road where vehicles leave and enter
    pub entry_point: Position,
    pub center: Position,
}

/// The road grid and the facilities placed on it
#[derive(Debug, Clone)]
pub struct RoadGrid {
    pub bounds: Rect,
    vertical: Vec<f32>,
    horizontal: Vec<f32>,
    facilities: Vec<Facility>,
}

impl RoadGrid {
    /// Build a grid from explicit axis positions
    pub fn new(bounds: Rect, vertical: Vec<f32>, horizontal: Vec<f32>) -> Result<Self> {
        ensure_valid_bounds(&bounds)?;
        ensure!(
            vertical.iter().chain(horizontal.iter()).all(|a| a.is_finite()),
            "road axes must be finite"
        );

        Ok(Self {
            bounds,
            vertical,
            horizontal,
            facilities: Vec::new(),
        })
    }

    /// Evenly spaced grid filling `bounds`, with a hospital in the top-left
    /// block, a fire station in the top-right block and a police station in
    /// the bottom-right block.
    pub fn regular(bounds: Rect) -> Result<Self> {
        ensure_valid_bounds(&bounds)?;

        let cols = ((bounds.width / TARGET_BLOCK_SIZE) as usize).max(2);
        let rows = ((bounds.height / TARGET_BLOCK_SIZE) as usize).max(2);
        ensure!(
            cols <= MAX_ROADS_PER_DIRECTION && rows <= MAX_ROADS_PER_DIRECTION,
            "world of {}x{} needs {}x{} roads, at most {} per direction are supported",
            bounds.width,
            bounds.height,
            cols,
            rows,
            MAX_ROADS_PER_DIRECTION
        );

        let space_x = bounds.width / cols as f32;
        let space_y = bounds.height / rows as f32;

        let vertical = (0..cols)
            .map(|i| bounds.x + space_x * i as f32 + space_x / 2.0)
            .collect::<Vec<_>>();
        let horizontal = (0..rows)
            .map(|i| bounds.y + space_y * i as f32 + space_y / 2.0)
            .collect::<Vec<_>>();

        let first_v = vertical[0];
        let last_v = vertical[cols - 1];
        let first_h = horizontal[0];
        let last_h = horizontal[rows - 1];

        let mut grid = Self::new(bounds, vertical, horizontal)?;

        grid.add_facility(
            VehicleClass::Ambulance,
            Position::new((bounds.x + first_v) / 2.0, (bounds.y + first_h) / 2.0),
        );
        grid.add_facility(
            VehicleClass::Fire,
            Position::new((last_v + bounds.right()) / 2.0, (bounds.y + first_h) / 2.0),
        );
        grid.add_facility(
            VehicleClass::Police,
            Position::new(
                (last_v + bounds.right()) / 2.0,
                (last_h + bounds.bottom()) / 2.0,
            ),
        );

        Ok(grid)
    }

    /// Place a facility centred on `center`.
    /// Its entry point is the centre projected onto the closer of the two
    /// nearest axes.
    pub fn add_facility(&mut self, class: VehicleClass, center: Position) -> &Facility {
        let entry_point = self.entry_point_for(center);
        self.facilities.push(Facility {
            class,
            bounding_box: Rect::centered(center, FACILITY_SIZE, FACILITY_SIZE),
            entry_point,
            center,
        });
        &self.facilities[self.facilities.len() - 1]
    }

    fn entry_point_for(&self, center: Position) -> Position {
        let cx = self.snap_vertical(center.x);
        let cy = self.snap_horizontal(center.y);
        if (center.x - cx).abs() < (center.y - cy).abs() {
            Position::new(cx, center.y)
        } else {
            Position::new(center.x, cy)
        }
    }

    pub fn vertical_axes(&self) -> &[f32] {
        &self.vertical
    }

    pub fn horizontal_axes(&self) -> &[f32] {
        &self.horizontal
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// The facility for a responder class; the first match wins
    pub fn facility_for(&self, class: VehicleClass) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.class == class)
    }

    /// Nearest vertical road axis to an x coordinate
    pub fn snap_vertical(&self, x: f32) -> f32 {
        nearest_axis(x, &self.vertical)
    }

    /// Nearest horizontal road axis to a y coordinate
    pub fn snap_horizontal(&self, y: f32) -> f32 {
        nearest_axis(y, &self.horizontal)
    }

    /// Centre of the world, used to pick the initial direction of responders
    pub fn center(&self) -> Position {
        self.bounds.center()
    }

    pub fn intersection_count(&self) -> usize {
        self.vertical.len() * self.horizontal.len()
    }

    /// Whether `point` lies inside any facility footprint
    pub fn is_on_facility(&self, point: Position) -> bool {
        self.facilities
            .iter()
            .any(|f| f.bounding_box.contains(point))
    }

    /// A uniformly chosen road intersection
    pub fn random_intersection(&self, rng: &mut StdRng) -> Option<Position> {
        if self.vertical.is_empty() || self.horizontal.is_empty() {
            return None;
        }
        let x = self.vertical[rng.random_range(0..self.vertical.len())];
        let y = self.horizontal[rng.random_range(0..self.horizontal.len())];
        Some(Position::new(x, y))
    }

    /// The zone of block (`col`, `row`) between road edges.
    /// Column 0 is the strip left of the first vertical road and column
    /// `vertical.len()` the strip right of the last one; rows likewise.
    pub fn block_zone(&self, col: usize, row: usize) -> Rect {
        let half_road = ROAD_WIDTH / 2.0;
        let min_x = if col == 0 {
            self.bounds.x
        } else {
            self.vertical[col - 1] + half_road
        };
        let max_x = if col >= self.vertical.len() {
            self.bounds.right()
        } else {
            self.vertical[col] - half_road
        };
        let min_y = if row == 0 {
            self.bounds.y
        } else {
            self.horizontal[row - 1] + half_road
        };
        let max_y = if row >= self.horizontal.len() {
            self.bounds.bottom()
        } else {
            self.horizontal[row] - half_road
        };
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// One attempt at finding a fire site: a corner of a random block,
    /// rejected if the block is too small or the corner is on a facility
    pub fn fire_site_candidate(&self, rng: &mut StdRng) -> Option<Position> {
        let col = rng.random_range(0..=self.vertical.len());
        let row = rng.random_range(0..=self.horizontal.len());
        let zone = self.block_zone(col, row);

        if zone.width <= MIN_BLOCK_EXTENT || zone.height <= MIN_BLOCK_EXTENT {
            return None;
        }

        let candidate = match rng.random_range(0..4) {
            0 => Position::new(zone.x + FIRE_CORNER_PAD, zone.y + FIRE_CORNER_PAD),
            1 => Position::new(zone.right() - FIRE_CORNER_PAD, zone.y + FIRE_CORNER_PAD),
            2 => Position::new(zone.x + FIRE_CORNER_PAD, zone.bottom() - FIRE_CORNER_PAD),
            _ => Position::new(zone.right() - FIRE_CORNER_PAD, zone.bottom() - FIRE_CORNER_PAD),
        };

        if self.is_on_facility(candidate) {
            None
        } else {
            Some(candidate)
        }
    }
}
