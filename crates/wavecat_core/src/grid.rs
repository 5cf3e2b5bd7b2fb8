//! Output grid of module/phase values over the swept parameter plane.

use crate::error::{CatastropheError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub module: f64,
    pub phase: f64,
}

impl Point {
    pub fn new(module: f64, phase: f64) -> Self {
        Self { module, phase }
    }
}

/// Which half of a point a projection exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    #[default]
    Module,
    Phase,
}

/// Row-major grid: row `i` follows the first alterable parameter, column `j`
/// the second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGrid {
    pub min_x: f64,
    pub max_x: f64,
    pub steps_x: usize,
    pub min_y: f64,
    pub max_y: f64,
    pub steps_y: usize,
    cells: Vec<Point>,
}

impl PointGrid {
    pub fn try_new(
        min_x: f64,
        max_x: f64,
        steps_x: usize,
        min_y: f64,
        max_y: f64,
        steps_y: usize,
    ) -> Result<Self> {
        let len = steps_x.checked_mul(steps_y).ok_or_else(|| {
            CatastropheError::AllocationFailure(format!(
                "grid of {steps_x} x {steps_y} points overflows"
            ))
        })?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|err| {
            CatastropheError::AllocationFailure(format!(
                "grid of {steps_x} x {steps_y} points: {err}"
            ))
        })?;
        cells.resize(len, Point::default());
        Ok(Self {
            min_x,
            max_x,
            steps_x,
            min_y,
            max_y,
            steps_y,
            cells,
        })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Point {
        self.cells[i * self.steps_y + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, point: Point) {
        self.cells[i * self.steps_y + j] = point;
    }

    pub fn row(&self, i: usize) -> &[Point] {
        let start = i * self.steps_y;
        &self.cells[start..start + self.steps_y]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Point]> {
        // chunks(0) panics.
        self.cells.chunks(self.steps_y.max(1)).take(self.steps_x)
    }

    /// Copies every row of `part` into this grid starting at row `first_row`.
    pub(crate) fn copy_rows_from(&mut self, part: &PointGrid, first_row: usize) {
        debug_assert_eq!(part.steps_y, self.steps_y);
        debug_assert!(first_row + part.steps_x <= self.steps_x);
        let start = first_row * self.steps_y;
        let len = part.cells.len();
        self.cells[start..start + len].copy_from_slice(&part.cells);
    }

    pub fn project(&self, component: Component) -> GridProjection {
        let value = |point: &Point| match component {
            Component::Module => point.module,
            Component::Phase => point.phase,
        };

        let data: Vec<Vec<f64>> = self
            .rows()
            .map(|row| row.iter().map(value).collect())
            .collect();

        let mut values = self.cells.iter().map(value);
        let first = values.next().unwrap_or(0.0);
        let (min_z, max_z) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

        GridProjection {
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y,
            data,
            min_z,
            max_z,
        }
    }
}

/// One component of a grid in the layout the plotting front end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProjection {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub data: Vec<Vec<f64>>,
    pub min_z: f64,
    pub max_z: f64,
}
