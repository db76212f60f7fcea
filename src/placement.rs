use rand::Rng;

use crate::types::{Axis, Coord, ShipPlacement};

pub const BOARD_SIZE: u32 = 10;

/// Classic fleet, largest first so the scatter places the awkward ships
/// while the board is still empty.
pub const FLEET: [u32; 10] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// Cells covered by one placement. Out-of-bounds extents are reported as
/// given; legality checks reject them.
pub fn ship_cells(p: &ShipPlacement) -> Vec<Coord> {
    (0..p.length)
        .map(|i| match p.axis {
            Axis::Horiz => Coord::new(p.row, p.col + i),
            Axis::Vert => Coord::new(p.row + i, p.col),
        })
        .collect()
}

/// The chain-side legality rules, mirrored so the editor can refuse a
/// board the chain would refuse: every cell in bounds, no overlap with an
/// existing ship, and no contact with one, diagonals included.
pub fn placement_fits(existing: &[ShipPlacement], candidate: &ShipPlacement, size: u32) -> bool {
    if candidate.length == 0 {
        return false;
    }
    let cells = ship_cells(candidate);
    if cells.iter().any(|c| c.row >= size || c.col >= size) {
        return false;
    }
    let occupied: Vec<Coord> = existing.iter().flat_map(ship_cells).collect();
    for cell in &cells {
        for other in &occupied {
            let dr = (cell.row as i64 - other.row as i64).abs();
            let dc = (cell.col as i64 - other.col as i64).abs();
            if dr <= 1 && dc <= 1 {
                return false;
            }
        }
    }
    true
}

/// Interactive board-placement state: fleet ships are committed one at a
/// time at the cursor, in `FLEET` order.
#[derive(Debug)]
pub struct PlacementEditor {
    size: u32,
    placements: Vec<ShipPlacement>,
    pub cursor: Coord,
    pub axis: Axis,
}

impl Default for PlacementEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementEditor {
    pub fn new() -> Self {
        Self {
            size: BOARD_SIZE,
            placements: Vec::new(),
            cursor: Coord::new(0, 0),
            axis: Axis::Horiz,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn placements(&self) -> &[ShipPlacement] {
        &self.placements
    }

    pub fn is_complete(&self) -> bool {
        self.placements.len() == FLEET.len()
    }

    /// Length of the ship currently being placed, if any remain.
    pub fn current_length(&self) -> Option<u32> {
        FLEET.get(self.placements.len()).copied()
    }

    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    pub fn move_cursor(&mut self, dr: i32, dc: i32) {
        let row = (self.cursor.row as i32 + dr).clamp(0, self.size as i32 - 1);
        let col = (self.cursor.col as i32 + dc).clamp(0, self.size as i32 - 1);
        self.cursor = Coord::new(row as u32, col as u32);
    }

    pub fn rotate(&mut self) {
        self.axis = match self.axis {
            Axis::Horiz => Axis::Vert,
            Axis::Vert => Axis::Horiz,
        };
    }

    fn candidate(&self) -> Option<ShipPlacement> {
        self.current_length().map(|length| ShipPlacement {
            row: self.cursor.row,
            col: self.cursor.col,
            length,
            axis: self.axis,
        })
    }

    /// Cells the next ship would cover at the cursor, clipped to the
    /// board, for the ghost overlay.
    pub fn ghost_cells(&self) -> Vec<Coord> {
        self.candidate()
            .map(|c| {
                ship_cells(&c)
                    .into_iter()
                    .filter(|c| c.row < self.size && c.col < self.size)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn ghost_legal(&self) -> bool {
        self.candidate()
            .map(|c| placement_fits(&self.placements, &c, self.size))
            .unwrap_or(false)
    }

    pub fn is_occupied(&self, at: Coord) -> bool {
        self.placements
            .iter()
            .flat_map(ship_cells)
            .any(|c| c == at)
    }

    /// Commit the next ship at the cursor. False (and untouched state)
    /// when the placement is illegal or the fleet is already complete.
    pub fn place(&mut self) -> bool {
        match self.candidate() {
            Some(c) if placement_fits(&self.placements, &c, self.size) => {
                self.placements.push(c);
                true
            }
            _ => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        self.placements.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }

    /// Scatter the whole fleet at random. Greedy per-ship sampling with a
    /// full restart on dead ends; on this board and fleet a handful of
    /// restarts is already rare.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) -> bool {
        const SHIP_TRIES: u32 = 256;
        const RESTARTS: u32 = 64;
        for _ in 0..RESTARTS {
            let mut placed: Vec<ShipPlacement> = Vec::with_capacity(FLEET.len());
            'fleet: for &length in FLEET.iter() {
                for _ in 0..SHIP_TRIES {
                    let axis = if rng.gen_bool(0.5) { Axis::Horiz } else { Axis::Vert };
                    let candidate = ShipPlacement {
                        row: rng.gen_range(0..self.size),
                        col: rng.gen_range(0..self.size),
                        length,
                        axis,
                    };
                    if placement_fits(&placed, &candidate, self.size) {
                        placed.push(candidate);
                        continue 'fleet;
                    }
                }
                break 'fleet;
            }
            if placed.len() == FLEET.len() {
                self.placements = placed;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ship(row: u32, col: u32, length: u32, axis: Axis) -> ShipPlacement {
        ShipPlacement { row, col, length, axis }
    }

    #[test]
    fn rejects_out_of_bounds_extent() {
        assert!(placement_fits(&[], &ship(0, 6, 4, Axis::Horiz), 10));
        assert!(!placement_fits(&[], &ship(0, 7, 4, Axis::Horiz), 10));
        assert!(!placement_fits(&[], &ship(8, 0, 4, Axis::Vert), 10));
        assert!(!placement_fits(&[], &ship(0, 0, 0, Axis::Horiz), 10));
    }

    #[test]
    fn rejects_overlap_and_any_contact() {
        let existing = [ship(5, 5, 3, Axis::Horiz)]; // covers (5,5)..(5,7)
        assert!(!placement_fits(&existing, &ship(5, 6, 1, Axis::Horiz), 10));
        // Side contact.
        assert!(!placement_fits(&existing, &ship(4, 5, 1, Axis::Horiz), 10));
        // Diagonal contact.
        assert!(!placement_fits(&existing, &ship(4, 4, 1, Axis::Horiz), 10));
        assert!(!placement_fits(&existing, &ship(6, 8, 1, Axis::Horiz), 10));
        // One cell of clearance is enough.
        assert!(placement_fits(&existing, &ship(7, 5, 1, Axis::Horiz), 10));
        assert!(placement_fits(&existing, &ship(5, 9, 1, Axis::Vert), 10));
    }

    #[test]
    fn editor_places_the_fleet_in_order() {
        let mut ed = PlacementEditor::new();
        assert_eq!(ed.current_length(), Some(4));
        assert!(ed.place()); // 4 at (0,0) horizontal
        assert_eq!(ed.current_length(), Some(3));

        // Touching the battleship is refused, state unchanged.
        ed.cursor = Coord::new(1, 0);
        assert!(!ed.place());
        assert_eq!(ed.placed_count(), 1);

        ed.cursor = Coord::new(2, 0);
        assert!(ed.place());
        assert!(ed.undo());
        assert_eq!(ed.placed_count(), 1);
        assert_eq!(ed.current_length(), Some(3));
    }

    #[test]
    fn complete_fleet_covers_twenty_cells() {
        let mut ed = PlacementEditor::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(ed.randomize(&mut rng));
        assert!(ed.is_complete());
        assert_eq!(ed.placements().len(), 10);
        let cells: usize = ed.placements().iter().map(|p| p.length as usize).sum();
        assert_eq!(cells, 20);
    }

    #[test]
    fn randomize_is_always_legal() {
        for seed in 0..20 {
            let mut ed = PlacementEditor::new();
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(ed.randomize(&mut rng), "seed {seed} failed to place");
            // Re-check every ship against the others.
            for (i, p) in ed.placements().iter().enumerate() {
                let mut others = ed.placements().to_vec();
                others.remove(i);
                assert!(placement_fits(&others, p, ed.size()), "seed {seed} ship {i}");
            }
        }
    }

    #[test]
    fn cursor_stays_on_the_board() {
        let mut ed = PlacementEditor::new();
        ed.move_cursor(-3, -3);
        assert_eq!(ed.cursor, Coord::new(0, 0));
        ed.move_cursor(100, 100);
        assert_eq!(ed.cursor, Coord::new(9, 9));
        ed.rotate();
        assert_eq!(ed.axis, Axis::Vert);
    }
}
