//! Fixed-size cell grid.
//!
//! The grid only knows what sits in each cell. Keeping entity positions and
//! cells in agreement is the zone's job.

use hecs::Entity;

use crate::error::{Result, SimError};

/// Inert terrain marker, identified by its display glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Terrain(pub char);

/// Contents of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Terrain(Terrain),
    Occupant(Entity),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn occupant(&self) -> Option<Entity> {
        match self {
            Cell::Occupant(entity) => Some(*entity),
            _ => None,
        }
    }
}

/// Unit steps in row/col order: up, right, down, left.
pub const CARDINAL_STEPS: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

#[derive(Debug, Clone)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Build a terrain grid from text rows. `.` and spaces are empty, any
    /// other glyph becomes a terrain marker. Short rows are padded empty.
    pub fn from_ascii(lines: &[&str]) -> Result<Self> {
        let rows = lines.len();
        let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(SimError::InvalidConfig("terrain map is empty".to_string()));
        }

        let mut grid = Self::new(rows, cols);
        for (row, line) in lines.iter().enumerate() {
            for (col, glyph) in line.chars().enumerate() {
                if glyph != '.' && glyph != ' ' {
                    grid.set_terrain(row as i32, col as i32, Terrain(glyph))?;
                }
            }
        }
        Ok(grid)
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        self.in_bounds(row, col)
            .then(|| row as usize * self.cols + col as usize)
    }

    pub fn get(&self, row: i32, col: i32) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Overwrite a cell. Returns false if out of bounds.
    pub(crate) fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Lay down a terrain marker. Only meant for building a zone, before any
    /// entity is placed.
    pub fn set_terrain(&mut self, row: i32, col: i32, terrain: Terrain) -> Result<()> {
        match self.get(row, col) {
            None => Err(SimError::OutOfBounds { row, col }),
            Some(Cell::Occupant(_)) => Err(SimError::Occupied { row, col }),
            Some(_) => {
                self.set(row, col, Cell::Terrain(terrain));
                Ok(())
            }
        }
    }

    /// True if the cell holds terrain or an entity. Out-of-bounds cells are
    /// not occupied, they just don't exist; see [`Grid::is_free`].
    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| !cell.is_empty())
    }

    /// In bounds and empty.
    pub fn is_free(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(Cell::is_empty)
    }

    pub fn occupant(&self, row: i32, col: i32) -> Option<Entity> {
        self.get(row, col).and_then(Cell::occupant)
    }

    /// In-bounds 4-neighbors, in up/right/down/left order.
    pub fn neighbors(&self, row: i32, col: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        CARDINAL_STEPS
            .iter()
            .map(move |(dr, dc)| (row + dr, col + dc))
            .filter(move |&(r, c)| self.in_bounds(r, c))
    }

    /// In-bounds cells of the square of half-width `radius` around a center,
    /// center excluded, row-major.
    pub fn cells_in_radius(
        &self,
        row: i32,
        col: i32,
        radius: i32,
    ) -> impl Iterator<Item = (i32, i32)> + '_ {
        (row - radius..=row + radius)
            .flat_map(move |r| (col - radius..=col + radius).map(move |c| (r, c)))
            .filter(move |&(r, c)| (r, c) != (row, col) && self.in_bounds(r, c))
    }
}

/// Euclidean distance between two cells.
pub fn distance(from: (i32, i32), to: (i32, i32)) -> f64 {
    let dr = (from.0 - to.0) as f64;
    let dc = (from.1 - to.1) as f64;
    (dr * dr + dc * dc).sqrt()
}

/// True if the cells share an edge.
pub fn is_adjacent(a: (i32, i32), b: (i32, i32)) -> bool {
    (a.0 - b.0).abs() + (a.1 - b.1).abs() == 1
}
