use crate::surface::{BoardSide, CellPaint, Surface};
use crate::types::{cell_index, Coord, EnemyCell, GameSnapshot};

/// What one `apply` did, for the status line and the action flow.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Cells whose rendered value actually changed.
    pub patched: usize,
    /// The pending-attack lock was released by authoritative data.
    pub pending_resolved: bool,
    /// Chain id of the winner once the room reached its terminal state.
    pub winner: Option<String>,
}

/// Converges the rendered boards on authoritative snapshots.
///
/// Owns the rendered-cell caches, the single pending-attack lock and the
/// refresh reentrancy guard. Deliberately synchronous and free of I/O:
/// fetching happens in spawned tasks, and every code path that observes a
/// snapshot funnels through [`Reconciler::apply`] on the UI loop.
#[derive(Debug, Default)]
pub struct Reconciler {
    size: u32,
    /// Own-board comparison keys: `(ship_id, attacked)` per cell.
    own: Vec<(Option<u32>, bool)>,
    /// Enemy-board comparison keys: the reveal tag per cell.
    enemy: Vec<EnemyCell>,
    pending: Option<Coord>,
    refreshing: bool,
    finished: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to fetch. Returns false while a fetch is already in
    /// flight or the screen is terminal, which is what collapses
    /// notification bursts into one snapshot request and keeps poll ticks
    /// from overlapping.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refreshing || self.finished {
            return false;
        }
        self.refreshing = true;
        true
    }

    /// Release the guard. Called for every fetch completion, success or
    /// failure, before the result is looked at.
    pub fn finish_refresh(&mut self) {
        self.refreshing = false;
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn pending(&self) -> Option<Coord> {
        self.pending
    }

    /// Diff `snap` against the rendered-cell caches and patch the surface
    /// where values differ. Cells equal to the cache are not touched, so
    /// applying the same snapshot twice leaves the surface alone.
    pub fn apply(&mut self, snap: &GameSnapshot, surface: &mut dyn Surface) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        if let Some(size) = snapshot_board_size(snap) {
            if size != self.size {
                self.remount(size, surface);
            }
        }

        if let Some(board) = &snap.my_board {
            for cell in &board.cells {
                let idx = cell_index(self.size, cell.row, cell.col);
                let key = (cell.ship_id, cell.attacked);
                match self.own.get_mut(idx) {
                    Some(cached) if *cached != key => {
                        *cached = key;
                        surface.apply_cell(
                            BoardSide::Own,
                            Coord::new(cell.row, cell.col),
                            own_paint(key),
                        );
                        outcome.patched += 1;
                    }
                    _ => {}
                }
            }
        }

        if let Some(view) = &snap.enemy_view {
            for (idx, tag) in view.cells.iter().enumerate() {
                match self.enemy.get_mut(idx) {
                    Some(cached) if *cached != *tag => {
                        *cached = *tag;
                        let at = Coord::new(idx as u32 / self.size, idx as u32 % self.size);
                        surface.apply_cell(BoardSide::Enemy, at, enemy_paint(*tag));
                        outcome.patched += 1;
                        // The lock is released only here: the cell left
                        // UNKNOWN in authoritative data. A tag still
                        // UNKNOWN produces no diff, so the loading paint
                        // from lock time stays up.
                        if self.pending == Some(at) {
                            self.pending = None;
                            outcome.pending_resolved = true;
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(winner) = snap
            .room
            .as_ref()
            .and_then(|r| r.winner_chain_id.as_ref())
        {
            self.finished = true;
            outcome.winner = Some(winner.clone());
        }

        outcome
    }

    /// Arm the pending-attack lock for `at` and paint it as loading.
    /// Refuses (returning false, no side effects) when a pending attack
    /// already exists, the cell is not UNKNOWN in the cache, the board is
    /// not mounted, or the game is over.
    pub fn lock_cell(&mut self, at: Coord, surface: &mut dyn Surface) -> bool {
        if self.pending.is_some() || self.finished || self.size == 0 {
            return false;
        }
        match self.enemy.get(cell_index(self.size, at.row, at.col)) {
            Some(EnemyCell::Unknown) => {}
            _ => return false,
        }
        self.pending = Some(at);
        surface.apply_cell(BoardSide::Enemy, at, CellPaint::Loading);
        true
    }

    /// Roll the lock back after the attack mutation itself failed: repaint
    /// the cell from the cache and free it for another try. There is no
    /// timeout path; once the mutation is accepted, only authoritative
    /// data releases the lock.
    pub fn unlock_on_error(&mut self, surface: &mut dyn Surface) {
        if let Some(at) = self.pending.take() {
            if let Some(tag) = self.enemy.get(cell_index(self.size, at.row, at.col)) {
                surface.apply_cell(BoardSide::Enemy, at, enemy_paint(*tag));
            }
        }
    }

    fn remount(&mut self, size: u32, surface: &mut dyn Surface) {
        let cells = (size * size) as usize;
        self.size = size;
        self.own = vec![(None, false); cells];
        self.enemy = vec![EnemyCell::Unknown; cells];
        self.pending = None;
        surface.mount(size);
    }
}

fn snapshot_board_size(snap: &GameSnapshot) -> Option<u32> {
    snap.my_board
        .as_ref()
        .map(|b| b.size)
        .or_else(|| snap.enemy_view.as_ref().map(|v| v.size))
}

fn own_paint(key: (Option<u32>, bool)) -> CellPaint {
    match key {
        (Some(_), true) => CellPaint::OwnHit,
        (Some(_), false) => CellPaint::OwnShip,
        (None, true) => CellPaint::OwnMiss,
        (None, false) => CellPaint::OwnWater,
    }
}

fn enemy_paint(tag: EnemyCell) -> CellPaint {
    match tag {
        EnemyCell::Unknown => CellPaint::Fog,
        EnemyCell::Miss => CellPaint::Miss,
        EnemyCell::Hit => CellPaint::Hit,
        EnemyCell::Sunk => CellPaint::Sunk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use crate::types::{
        EnemyBoardView, GameState, MyBoardView, MyCellView, PlayerInfo, Room, RoomStatus,
    };

    fn test_room(winner: Option<&str>) -> Room {
        Room {
            room_id: "room-1".into(),
            host_chain_id: "aaaa".into(),
            status: RoomStatus::Active,
            game_state: if winner.is_some() { GameState::Ended } else { GameState::InGame },
            players: vec![
                PlayerInfo { chain_id: "aaaa".into(), name: "Ada".into(), board_submitted: true },
                PlayerInfo { chain_id: "bbbb".into(), name: "Bob".into(), board_submitted: true },
            ],
            current_attacker: Some("aaaa".into()),
            pending_attack: None,
            winner_chain_id: winner.map(str::to_string),
        }
    }

    fn test_snapshot(size: u32, enemy: Vec<EnemyCell>, winner: Option<&str>) -> GameSnapshot {
        let mut cells = Vec::new();
        for row in 0..size {
            for col in 0..size {
                cells.push(MyCellView {
                    row,
                    col,
                    ship_id: if row == 0 && col == 0 { Some(1) } else { None },
                    attacked: false,
                });
            }
        }
        GameSnapshot {
            room: Some(test_room(winner)),
            my_board: Some(MyBoardView { size, cells, ships: Vec::new() }),
            enemy_view: Some(EnemyBoardView { size, cells: enemy }),
            is_my_turn: true,
            has_submitted_board: true,
            last_notification: None,
        }
    }

    #[test]
    fn refresh_guard_collapses_bursts() {
        let mut r = Reconciler::new();
        assert!(r.begin_refresh());
        // Further change signals while the fetch is in flight are dropped.
        assert!(!r.begin_refresh());
        assert!(!r.begin_refresh());
        r.finish_refresh();
        assert!(r.begin_refresh());
    }

    #[test]
    fn identical_snapshot_patches_nothing_the_second_time() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        let mut enemy = vec![EnemyCell::Unknown; 16];
        enemy[5] = EnemyCell::Hit;
        let snap = test_snapshot(4, enemy, None);

        let first = r.apply(&snap, &mut s);
        assert!(first.patched > 0);

        s.clear_patches();
        let second = r.apply(&snap, &mut s);
        assert_eq!(second.patched, 0);
        assert!(s.patches.is_empty());
    }

    #[test]
    fn first_board_mounts_the_surface_once() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        let snap = test_snapshot(4, vec![EnemyCell::Unknown; 16], None);
        r.apply(&snap, &mut s);
        r.apply(&snap, &mut s);
        assert_eq!(s.mounts, vec![4]);
    }

    #[test]
    fn lock_requires_unknown_cell_and_no_pending() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        let mut enemy = vec![EnemyCell::Unknown; 16];
        enemy[1] = EnemyCell::Miss;
        r.apply(&test_snapshot(4, enemy, None), &mut s);

        // Already-revealed cell refuses the lock.
        assert!(!r.lock_cell(Coord::new(0, 1), &mut s));
        assert!(r.lock_cell(Coord::new(2, 2), &mut s));
        assert_eq!(r.pending(), Some(Coord::new(2, 2)));
        // Only one action may be pending at a time.
        assert!(!r.lock_cell(Coord::new(3, 3), &mut s));
        assert_eq!(
            s.patches.last(),
            Some(&(BoardSide::Enemy, Coord::new(2, 2), CellPaint::Loading))
        );
    }

    #[test]
    fn unknown_tag_keeps_the_lock_and_the_loading_paint() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        let snap = test_snapshot(4, vec![EnemyCell::Unknown; 16], None);
        r.apply(&snap, &mut s);
        assert!(r.lock_cell(Coord::new(1, 1), &mut s));

        s.clear_patches();
        let outcome = r.apply(&snap, &mut s);
        assert_eq!(outcome.patched, 0);
        assert!(!outcome.pending_resolved);
        assert_eq!(r.pending(), Some(Coord::new(1, 1)));
        // Nothing overwrote the loading paint.
        assert!(s.patches.is_empty());
    }

    #[test]
    fn authoritative_tag_releases_the_lock() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        r.apply(&test_snapshot(4, vec![EnemyCell::Unknown; 16], None), &mut s);
        assert!(r.lock_cell(Coord::new(1, 1), &mut s));

        let mut enemy = vec![EnemyCell::Unknown; 16];
        enemy[cell_index(4, 1, 1)] = EnemyCell::Hit;
        s.clear_patches();
        let outcome = r.apply(&test_snapshot(4, enemy, None), &mut s);
        assert!(outcome.pending_resolved);
        assert_eq!(r.pending(), None);
        assert_eq!(
            s.patches,
            vec![(BoardSide::Enemy, Coord::new(1, 1), CellPaint::Hit)]
        );
        // The freed cell is revealed now, so it cannot be locked again.
        assert!(!r.lock_cell(Coord::new(1, 1), &mut s));
    }

    #[test]
    fn failed_mutation_rolls_the_lock_back() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        r.apply(&test_snapshot(4, vec![EnemyCell::Unknown; 16], None), &mut s);
        assert!(r.lock_cell(Coord::new(2, 0), &mut s));

        s.clear_patches();
        r.unlock_on_error(&mut s);
        assert_eq!(r.pending(), None);
        assert_eq!(
            s.patches,
            vec![(BoardSide::Enemy, Coord::new(2, 0), CellPaint::Fog)]
        );
        // The cell is free for another try.
        assert!(r.lock_cell(Coord::new(2, 0), &mut s));
    }

    #[test]
    fn winner_marks_the_reconciler_finished() {
        let mut r = Reconciler::new();
        let mut s = RecordingSurface::new();
        let outcome = r.apply(
            &test_snapshot(4, vec![EnemyCell::Unknown; 16], Some("bbbb")),
            &mut s,
        );
        assert_eq!(outcome.winner.as_deref(), Some("bbbb"));
        assert!(r.is_finished());
        // Terminal screens stop fetching and stop accepting actions.
        assert!(!r.begin_refresh());
        assert!(!r.lock_cell(Coord::new(0, 0), &mut s));
    }
}
