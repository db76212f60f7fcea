use crate::types::{cell_index, Coord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSide {
    Own,
    Enemy,
}

/// Final rendered value of one board cell. The reconciler only ever talks
/// to the renderer in this vocabulary; widgets decide glyphs and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPaint {
    // Own board
    OwnWater,
    OwnShip,
    OwnHit,
    OwnMiss,
    // Enemy board
    Fog,
    Miss,
    Hit,
    Sunk,
    /// An attack is in flight for this cell and no authoritative result
    /// has arrived yet.
    Loading,
}

/// What a screen needs from its renderer. One surface is mounted per
/// screen; transitions tear it down before the next screen mounts.
pub trait Surface {
    /// (Re)create both board areas at `size`, every cell in its default
    /// paint (`OwnWater` / `Fog`). Mounting over a live surface resets it.
    fn mount(&mut self, size: u32);
    fn apply_cell(&mut self, side: BoardSide, at: Coord, paint: CellPaint);
    /// Release whatever `mount` created. Idempotent; never fails.
    fn teardown(&mut self);
}

/// Retained-mode surface the terminal renderer draws from each frame.
#[derive(Debug, Default)]
pub struct GridSurface {
    size: u32,
    own: Vec<CellPaint>,
    enemy: Vec<CellPaint>,
    mounted: bool,
}

impl GridSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn own_cell(&self, at: Coord) -> Option<CellPaint> {
        self.own.get(cell_index(self.size, at.row, at.col)).copied()
    }

    pub fn enemy_cell(&self, at: Coord) -> Option<CellPaint> {
        self.enemy.get(cell_index(self.size, at.row, at.col)).copied()
    }
}

impl Surface for GridSurface {
    fn mount(&mut self, size: u32) {
        let cells = (size * size) as usize;
        self.size = size;
        self.own = vec![CellPaint::OwnWater; cells];
        self.enemy = vec![CellPaint::Fog; cells];
        self.mounted = true;
    }

    fn apply_cell(&mut self, side: BoardSide, at: Coord, paint: CellPaint) {
        if !self.mounted {
            return;
        }
        let idx = cell_index(self.size, at.row, at.col);
        let grid = match side {
            BoardSide::Own => &mut self.own,
            BoardSide::Enemy => &mut self.enemy,
        };
        if let Some(cell) = grid.get_mut(idx) {
            *cell = paint;
        }
    }

    fn teardown(&mut self) {
        self.size = 0;
        self.own.clear();
        self.enemy.clear();
        self.mounted = false;
    }
}

/// Surface that records calls instead of drawing. The reconciler tests
/// assert against the patch log to check what a refresh actually touched.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub mounts: Vec<u32>,
    pub teardowns: u32,
    pub patches: Vec<(BoardSide, Coord, CellPaint)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_patches(&mut self) {
        self.patches.clear();
    }
}

impl Surface for RecordingSurface {
    fn mount(&mut self, size: u32) {
        self.mounts.push(size);
    }

    fn apply_cell(&mut self, side: BoardSide, at: Coord, paint: CellPaint) {
        self.patches.push((side, at, paint));
    }

    fn teardown(&mut self) {
        self.teardowns += 1;
    }
}
