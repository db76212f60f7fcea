use crate::clipboard;
use crate::config::Config;
use crate::gateway::{GatewayError, NodeClient};
use crate::notify::{self, FeedKind, SubscriptionHandle};
use crate::ops;
use crate::placement::{PlacementEditor, FLEET};
use crate::reconcile::Reconciler;
use crate::screen::{phase_for, Phase};
use crate::session::SessionStore;
use crate::snapshot;
use crate::surface::{GridSurface, Surface};
use crate::theme::ColorScheme;
use crate::types::{ActionKind, Coord, GameSnapshot, UiEvent};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LobbyMode {
    Menu,
    EnterName,
    EnterHostChain,
}

/// Menu entries on the lobby screen, in render order.
pub const LOBBY_MENU: [&str; 6] = [
    "Create room",
    "Join room",
    "Quick match",
    "Set name",
    "Copy chain id",
    "Quit",
];

#[derive(Debug)]
pub struct LobbyState {
    pub mode: LobbyMode,
    pub selected: usize,
    pub input: String,
}

impl Default for LobbyState {
    fn default() -> Self {
        Self {
            mode: LobbyMode::Menu,
            selected: 0,
            input: String::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// Footer line: outcome of the last action or error, kept until replaced.
#[derive(Clone, Debug)]
pub struct StatusLine {
    pub text: String,
    pub level: StatusLevel,
    pub when: String,
}

/// Admits one effectful chain operation at a time. A second trigger while
/// one is in flight is a silent no-op.
#[derive(Debug, Default)]
struct ActionGate {
    in_flight: Option<&'static str>,
}

impl ActionGate {
    fn arm(&mut self, label: &'static str) {
        self.in_flight = Some(label);
    }

    fn release(&mut self) {
        self.in_flight = None;
    }

    fn busy(&self) -> Option<&'static str> {
        self.in_flight
    }
}

pub struct App {
    cfg: Config,
    client: NodeClient,
    session: SessionStore,
    events_tx: UnboundedSender<UiEvent>,
    colors: ColorScheme,

    phase: Phase,
    /// Monotonic. Bumped on every screen change; continuations spawned
    /// before the bump come back with a stale copy and are dropped.
    view_token: u64,
    reconciler: Reconciler,
    surface: GridSurface,
    feed: Option<SubscriptionHandle>,
    gate: ActionGate,

    // Per-screen state
    lobby: LobbyState,
    editor: PlacementEditor,
    cursor: Coord,                 // enemy-board cursor during the battle
    snapshot: GameSnapshot,        // last applied authoritative read
    winner: Option<String>,
    init_error: Option<String>,

    status: Option<StatusLine>,
    debug_log: Vec<String>,        // rolling buffer behind the Ctrl+D panel
    debug_visible: bool,
    quit: bool,
}

impl App {
    pub fn new(cfg: Config, session: SessionStore, events_tx: UnboundedSender<UiEvent>) -> Self {
        let client = NodeClient::new(&cfg.node_url, &cfg.app_id, cfg.rpc_timeout_ms);
        let colors = cfg.theme.colors();
        Self {
            cfg,
            client,
            session,
            events_tx,
            colors,
            phase: Phase::Lobby,
            view_token: 0,
            reconciler: Reconciler::new(),
            surface: GridSurface::new(),
            feed: None,
            gate: ActionGate::default(),
            lobby: LobbyState::default(),
            editor: PlacementEditor::new(),
            cursor: Coord::new(0, 0),
            snapshot: GameSnapshot::default(),
            winner: None,
            init_error: None,
            status: None,
            debug_log: Vec::new(),
            debug_visible: false,
            quit: false,
        }
    }

    /// Consume the startup probe. A failed probe is fatal for everything
    /// but quitting; a successful one lands on whatever screen the chain
    /// says, including rejoining a game already in progress.
    pub fn start(&mut self, probe: Result<GameSnapshot, GatewayError>) {
        match probe {
            Err(e) => {
                log::error!("startup probe failed: {e}");
                self.init_error = Some(e.to_string());
                self.phase = Phase::InitError;
            }
            Ok(snap) => {
                self.transition_to(phase_for(&snap));
                self.apply_snapshot(snap);
            }
        }
    }

    // ----- getters -----
    pub fn quit_flag(&self) -> bool {
        self.quit
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn fps(&self) -> u32 {
        self.cfg.render_fps
    }
    pub fn colors(&self) -> &ColorScheme {
        &self.colors
    }
    pub fn chain_id(&self) -> &str {
        &self.cfg.chain_id
    }
    pub fn view_token(&self) -> u64 {
        self.view_token
    }
    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }
    pub fn surface(&self) -> &GridSurface {
        &self.surface
    }
    pub fn editor(&self) -> &PlacementEditor {
        &self.editor
    }
    pub fn cursor(&self) -> Coord {
        self.cursor
    }
    /// This player's unresolved attack, if one is locked in.
    pub fn pending_attack(&self) -> Option<Coord> {
        self.reconciler.pending()
    }
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }
    pub fn init_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }
    pub fn lobby(&self) -> &LobbyState {
        &self.lobby
    }
    pub fn gate_busy(&self) -> Option<&str> {
        self.gate.busy()
    }
    pub fn feed_kind(&self) -> Option<FeedKind> {
        self.feed.as_ref().map(|f| f.kind())
    }
    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }
    pub fn debug_log(&self) -> &[String] {
        &self.debug_log
    }

    pub fn is_host(&self) -> bool {
        self.snapshot
            .room
            .as_ref()
            .map(|r| r.host_chain_id == self.cfg.chain_id)
            .unwrap_or(false)
    }

    /// The chain enforces the same rules; this only decides whether the
    /// start control is shown armed.
    pub fn can_start_game(&self) -> bool {
        let Some(room) = &self.snapshot.room else {
            return false;
        };
        self.is_host() && room.players.len() == 2 && room.players.iter().all(|p| p.board_submitted)
    }

    pub fn won_by_me(&self) -> bool {
        self.winner.as_deref() == Some(self.cfg.chain_id.as_str())
    }

    /// Display name for chain operations: explicit flag first, then the
    /// saved nickname, then a name derived from the chain id.
    pub fn player_name(&self) -> String {
        if let Some(name) = &self.cfg.player_name {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        let nick = self.session.nickname().trim();
        if !nick.is_empty() {
            return nick.to_string();
        }
        let tail: String = self.cfg.chain_id.chars().take(6).collect();
        format!("captain-{tail}")
    }

    // ----- event loop -----

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn toggle_debug_panel(&mut self) {
        self.debug_visible = !self.debug_visible;
    }

    pub fn log_debug(&mut self, msg: String) {
        const MAX_LOG_ENTRIES: usize = 50;
        let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
        self.debug_log.push(format!("[{stamp}] {msg}"));
        if self.debug_log.len() > MAX_LOG_ENTRIES {
            self.debug_log.remove(0);
        }
    }

    pub fn on_event(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::Changed { token } => {
                if token == self.view_token {
                    self.request_refresh();
                }
            }
            UiEvent::FeedLost { token } => {
                if token != self.view_token {
                    return;
                }
                self.set_error("live updates lost, falling back to polling".to_string());
                self.feed = Some(notify::spawn_poll_feed(
                    &self.cfg,
                    self.view_token,
                    self.events_tx.clone(),
                ));
            }
            UiEvent::SnapshotReady { token, result } => {
                if token != self.view_token {
                    self.log_debug(format!("dropped stale snapshot (token {token})"));
                    return;
                }
                // The guard opens before the result is inspected so an
                // error cannot wedge future refreshes.
                self.reconciler.finish_refresh();
                match result {
                    Ok(snap) => self.apply_snapshot(snap),
                    Err(e) => self.set_error(format!("refresh failed: {e}")),
                }
            }
            UiEvent::ActionDone { token, action, result } => {
                // The gate is app-wide: release it even when the screen
                // has moved on and the rest of the event is stale.
                self.gate.release();
                if token != self.view_token {
                    return;
                }
                match result {
                    Ok(()) => {
                        self.log_debug(format!("{} accepted", action.label()));
                        if action == ActionKind::LeaveRoom {
                            // The mutation ran on this chain, so the room
                            // is already gone; no read-back needed before
                            // switching screens.
                            self.winner = None;
                            self.snapshot = GameSnapshot::default();
                            self.transition_to(Phase::Lobby);
                        } else {
                            self.request_refresh();
                        }
                    }
                    Err(e) => {
                        if matches!(action, ActionKind::Attack(_)) {
                            self.reconciler.unlock_on_error(&mut self.surface);
                        }
                        self.set_error(format!("{} failed: {e}", action.label()));
                    }
                }
            }
        }
    }

    /// Ask for a fresh snapshot unless one is already on the way. Change
    /// signals landing while the fetch runs are absorbed here, which turns
    /// a notification burst into a single read.
    pub fn request_refresh(&mut self) {
        if !self.reconciler.begin_refresh() {
            return;
        }
        let token = self.view_token;
        let client = self.client.clone();
        let chain_id = self.cfg.chain_id.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = snapshot::fetch(&client, &chain_id).await;
            let _ = tx.send(UiEvent::SnapshotReady { token, result });
        });
    }

    fn apply_snapshot(&mut self, snap: GameSnapshot) {
        let outcome = self.reconciler.apply(&snap, &mut self.surface);
        if outcome.patched > 0 {
            self.log_debug(format!("snapshot applied, {} cell(s) changed", outcome.patched));
        }
        if outcome.pending_resolved {
            self.log_debug("pending attack resolved by chain data".to_string());
        }
        if snap.last_notification.is_some()
            && snap.last_notification != self.snapshot.last_notification
        {
            if let Some(note) = &snap.last_notification {
                self.set_status(note.clone());
            }
        }
        if let Some(w) = outcome.winner {
            self.winner = Some(w);
        }
        self.snapshot = snap;
        let next = phase_for(&self.snapshot);
        if next != self.phase {
            self.transition_to(next);
        }
    }

    /// Screen changes follow one sequence: stop the old feed, bump the
    /// view token, reset per-screen state, then start the new feed and
    /// fetch. The terminal screen keeps the final boards up and starts
    /// nothing.
    fn transition_to(&mut self, next: Phase) {
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
        }
        self.view_token += 1;
        self.log_debug(format!(
            "screen {:?} -> {:?} (token {})",
            self.phase, next, self.view_token
        ));
        self.phase = next;

        match next {
            Phase::Lobby | Phase::Waiting | Phase::Placement | Phase::InGame => {
                self.reconciler = Reconciler::new();
                self.surface.teardown();
                match next {
                    Phase::Lobby => self.lobby = LobbyState::default(),
                    Phase::Placement => self.editor = PlacementEditor::new(),
                    Phase::InGame => self.cursor = Coord::new(0, 0),
                    _ => {}
                }
                self.feed = Some(notify::spawn_change_feed(
                    &self.cfg,
                    self.view_token,
                    self.events_tx.clone(),
                ));
                self.request_refresh();
            }
            Phase::Ended => {}
            Phase::InitError => {
                self.reconciler = Reconciler::new();
                self.surface.teardown();
            }
        }
    }

    fn issue_action(&mut self, action: ActionKind, text: String) -> bool {
        if let Some(busy) = self.gate.busy() {
            self.log_debug(format!("{} ignored while {busy} is in flight", action.label()));
            return false;
        }
        self.gate.arm(action.label());
        let token = self.view_token;
        let client = self.client.clone();
        let chain_id = self.cfg.chain_id.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.query(&chain_id, &text).await.map(|_| ());
            let _ = tx.send(UiEvent::ActionDone { token, action, result });
        });
        true
    }

    // ----- lobby -----

    pub fn lobby_move(&mut self, delta: i32) {
        if self.lobby.mode != LobbyMode::Menu {
            return;
        }
        let len = LOBBY_MENU.len() as i32;
        self.lobby.selected = (self.lobby.selected as i32 + delta).rem_euclid(len) as usize;
    }

    pub fn lobby_activate(&mut self) {
        if self.phase != Phase::Lobby {
            return;
        }
        match self.lobby.mode {
            LobbyMode::Menu => match self.lobby.selected {
                0 => {
                    let name = self.player_name();
                    if self.issue_action(ActionKind::CreateRoom, ops::create_room(&name)) {
                        self.set_status(format!("creating room as {name}..."));
                    }
                }
                1 => {
                    self.lobby.mode = LobbyMode::EnterHostChain;
                    self.lobby.input.clear();
                }
                2 => self.quick_match(),
                3 => {
                    self.lobby.mode = LobbyMode::EnterName;
                    self.lobby.input = self.session.nickname().to_string();
                }
                4 => self.copy_chain_id(),
                _ => self.request_quit(),
            },
            LobbyMode::EnterHostChain => {
                let host = self.lobby.input.trim().to_string();
                if host.is_empty() {
                    self.set_error("host chain id is empty".to_string());
                    return;
                }
                let name = self.player_name();
                if self.issue_action(ActionKind::JoinRoom, ops::join_room(&host, &name)) {
                    self.set_status(format!("joining {host}..."));
                    self.lobby.mode = LobbyMode::Menu;
                }
            }
            LobbyMode::EnterName => {
                let name = self.lobby.input.trim().to_string();
                match self.session.set_nickname(&name) {
                    Ok(()) => self.set_status(format!("playing as {}", self.player_name())),
                    Err(e) => self.set_error(format!("could not save nickname: {e}")),
                }
                self.lobby.mode = LobbyMode::Menu;
            }
        }
    }

    fn quick_match(&mut self) {
        let Some(orchestrator) = self.cfg.matchmaker_chain_id.clone() else {
            self.set_error("no matchmaker chain configured (--matchmaker-chain-id)".to_string());
            return;
        };
        let name = self.player_name();
        if self.issue_action(ActionKind::SearchPlayer, ops::search_player(&orchestrator, &name)) {
            self.set_status("looking for an opponent...".to_string());
        }
    }

    pub fn copy_chain_id(&mut self) {
        if clipboard::copy_to_clipboard(&self.cfg.chain_id) {
            self.set_status("chain id copied to clipboard".to_string());
        } else {
            self.set_error("clipboard unavailable".to_string());
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.lobby.mode == LobbyMode::Menu || c.is_control() {
            return;
        }
        self.lobby.input.push(c);
    }

    pub fn input_backspace(&mut self) {
        if self.lobby.mode != LobbyMode::Menu {
            self.lobby.input.pop();
        }
    }

    pub fn input_cancel(&mut self) {
        self.lobby.mode = LobbyMode::Menu;
        self.lobby.input.clear();
    }

    // ----- placement -----

    pub fn placement_move(&mut self, dr: i32, dc: i32) {
        self.editor.move_cursor(dr, dc);
    }

    pub fn placement_rotate(&mut self) {
        self.editor.rotate();
    }

    pub fn placement_place(&mut self) {
        if self.snapshot.has_submitted_board {
            return;
        }
        if !self.editor.place() {
            self.set_error("blocked: ships cannot overlap or touch".to_string());
        }
    }

    pub fn placement_undo(&mut self) {
        if !self.snapshot.has_submitted_board {
            self.editor.undo();
        }
    }

    pub fn placement_clear(&mut self) {
        if !self.snapshot.has_submitted_board {
            self.editor.clear();
        }
    }

    pub fn placement_randomize(&mut self) {
        if self.snapshot.has_submitted_board {
            return;
        }
        let mut rng = rand::thread_rng();
        if !self.editor.randomize(&mut rng) {
            self.set_error("could not find a random layout".to_string());
        }
    }

    pub fn placement_submit(&mut self) {
        if self.phase != Phase::Placement || self.snapshot.has_submitted_board {
            return;
        }
        if !self.editor.is_complete() {
            self.set_error(format!(
                "fleet incomplete: {} of {} ships placed",
                self.editor.placed_count(),
                FLEET.len()
            ));
            return;
        }
        if self.issue_action(ActionKind::SubmitBoard, ops::submit_board(self.editor.placements())) {
            self.set_status("fleet submitted".to_string());
        }
    }

    pub fn request_start_game(&mut self) {
        if self.phase != Phase::Placement || !self.can_start_game() {
            return;
        }
        if self.issue_action(ActionKind::StartGame, ops::start_game()) {
            self.set_status("starting game...".to_string());
        }
    }

    // ----- battle -----

    pub fn game_move(&mut self, dr: i32, dc: i32) {
        let size = self.surface.size().max(1) as i32;
        let row = (self.cursor.row as i32 + dr).clamp(0, size - 1);
        let col = (self.cursor.col as i32 + dc).clamp(0, size - 1);
        self.cursor = Coord::new(row as u32, col as u32);
    }

    /// Fire at the cursor. Refuses silently unless it is this player's
    /// turn, the cell is unrevealed, no attack is pending and nothing else
    /// is in flight. The loading paint stays up until authoritative data
    /// reveals the cell; a rejected mutation rolls it back.
    pub fn try_attack(&mut self) {
        if self.phase != Phase::InGame || self.winner.is_some() {
            return;
        }
        if !self.snapshot.is_my_turn {
            self.log_debug("attack ignored: not this player's turn".to_string());
            return;
        }
        if self.gate.busy().is_some() {
            return;
        }
        let at = self.cursor;
        if !self.reconciler.lock_cell(at, &mut self.surface) {
            return;
        }
        self.issue_action(ActionKind::Attack(at), ops::attack(at.row, at.col));
    }

    /// Ask the chain to drop the room. The screen flips once the mutation
    /// lands, not before.
    pub fn leave_room(&mut self) {
        if matches!(
            self.phase,
            Phase::Waiting | Phase::Placement | Phase::InGame | Phase::Ended
        ) {
            if self.issue_action(ActionKind::LeaveRoom, ops::leave_room()) {
                self.set_status("leaving room...".to_string());
            }
        }
    }

    // ----- status -----

    fn set_status(&mut self, text: String) {
        self.log_debug(format!("status: {text}"));
        self.status = Some(StatusLine {
            text,
            level: StatusLevel::Info,
            when: chrono::Local::now().format("%H:%M:%S").to_string(),
        });
    }

    fn set_error(&mut self, text: String) {
        log::warn!("{text}");
        self.log_debug(format!("error: {text}"));
        self.status = Some(StatusLine {
            text,
            level: StatusLevel::Error,
            when: chrono::Local::now().format("%H:%M:%S").to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;
    use crate::gateway::GatewayError;
    use crate::surface::CellPaint;
    use crate::theme::Theme;
    use crate::types::{
        EnemyBoardView, EnemyCell, GameState, MyBoardView, MyCellView, PlayerInfo, Room,
        RoomStatus,
    };
    use std::path::PathBuf;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("broadside-app-{tag}-{}.toml", rand::random::<u64>()))
    }

    fn test_config(session_file: PathBuf) -> Config {
        Config {
            source: Source::Poll,
            node_url: "http://127.0.0.1:9".into(),
            ws_url: "ws://127.0.0.1:9/ws".into(),
            app_id: "app".into(),
            chain_id: "aaaa".into(),
            matchmaker_chain_id: None,
            // Long enough that no poll tick fires during a test.
            poll_interval_ms: 600_000,
            rpc_timeout_ms: 1_000,
            render_fps: 30,
            player_name: Some("Ada".into()),
            session_file,
            theme: Theme::Nord,
        }
    }

    fn test_app() -> (App, UnboundedReceiver<UiEvent>) {
        let path = scratch_path("cfg");
        let session = SessionStore::load_or_create(&path).unwrap();
        let (tx, rx) = unbounded_channel();
        (App::new(test_config(path), session, tx), rx)
    }

    fn room(state: GameState, winner: Option<&str>) -> Room {
        Room {
            room_id: "room-1".into(),
            host_chain_id: "aaaa".into(),
            status: RoomStatus::Active,
            game_state: state,
            players: vec![
                PlayerInfo {
                    chain_id: "aaaa".into(),
                    name: "Ada".into(),
                    board_submitted: true,
                },
                PlayerInfo {
                    chain_id: "bbbb".into(),
                    name: "Bob".into(),
                    board_submitted: true,
                },
            ],
            current_attacker: Some("aaaa".into()),
            pending_attack: None,
            winner_chain_id: winner.map(str::to_string),
        }
    }

    fn battle_snapshot(my_turn: bool, winner: Option<&str>) -> GameSnapshot {
        let size = 10u32;
        let mut cells = Vec::new();
        for row in 0..size {
            for col in 0..size {
                cells.push(MyCellView { row, col, ship_id: None, attacked: false });
            }
        }
        GameSnapshot {
            room: Some(room(GameState::InGame, winner)),
            my_board: Some(MyBoardView { size, cells, ships: Vec::new() }),
            enemy_view: Some(EnemyBoardView {
                size,
                cells: vec![EnemyCell::Unknown; (size * size) as usize],
            }),
            is_my_turn: my_turn,
            has_submitted_board: true,
            last_notification: None,
        }
    }

    fn waiting_snapshot() -> GameSnapshot {
        let mut r = room(GameState::WaitingForPlayer, None);
        r.players.truncate(1);
        GameSnapshot { room: Some(r), ..GameSnapshot::default() }
    }

    #[test]
    fn failed_probe_is_fatal() {
        let (mut app, _rx) = test_app();
        app.start(Err(GatewayError::Transport("connect refused".into())));
        assert_eq!(app.phase(), Phase::InitError);
        assert!(app.init_error().unwrap().contains("connect refused"));
        assert!(app.feed_kind().is_none());
    }

    #[tokio::test]
    async fn probe_lands_on_the_screen_the_chain_names() {
        let (mut app, _rx) = test_app();
        app.start(Ok(waiting_snapshot()));
        assert_eq!(app.phase(), Phase::Waiting);
        assert!(app.feed_kind().is_some());
        assert!(app.view_token() > 0);
    }

    #[tokio::test]
    async fn stale_snapshots_are_dropped() {
        let (mut app, _rx) = test_app();
        app.start(Ok(battle_snapshot(true, None)));
        assert_eq!(app.phase(), Phase::InGame);

        // A roomless snapshot would route to the lobby, but this one was
        // spawned under a token that no longer exists.
        app.on_event(UiEvent::SnapshotReady {
            token: app.view_token() + 5,
            result: Ok(GameSnapshot::default()),
        });
        assert_eq!(app.phase(), Phase::InGame);
        assert!(app.snapshot().room.is_some());
    }

    #[tokio::test]
    async fn leave_completion_returns_to_the_lobby() {
        let (mut app, _rx) = test_app();
        app.start(Ok(battle_snapshot(true, None)));
        app.leave_room();
        assert_eq!(app.gate_busy(), Some("leave room"));

        app.on_event(UiEvent::ActionDone {
            token: app.view_token(),
            action: ActionKind::LeaveRoom,
            result: Ok(()),
        });
        assert_eq!(app.phase(), Phase::Lobby);
        assert!(app.gate_busy().is_none());
        assert!(app.snapshot().room.is_none());
        assert!(app.winner().is_none());
    }

    #[tokio::test]
    async fn attack_locks_the_cell_and_failure_rolls_it_back() {
        let (mut app, _rx) = test_app();
        app.start(Ok(battle_snapshot(true, None)));
        app.game_move(2, 3);
        app.try_attack();

        assert_eq!(app.gate_busy(), Some("attack"));
        assert_eq!(app.surface().enemy_cell(Coord::new(2, 3)), Some(CellPaint::Loading));
        // Locked means locked: a second shot anywhere is refused.
        app.game_move(1, 0);
        app.try_attack();
        assert_eq!(app.gate_busy(), Some("attack"));

        app.on_event(UiEvent::ActionDone {
            token: app.view_token(),
            action: ActionKind::Attack(Coord::new(2, 3)),
            result: Err(GatewayError::Remote("not your turn".into())),
        });
        assert!(app.gate_busy().is_none());
        assert_eq!(app.surface().enemy_cell(Coord::new(2, 3)), Some(CellPaint::Fog));
        assert_eq!(app.status().unwrap().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn attacks_need_the_turn() {
        let (mut app, _rx) = test_app();
        app.start(Ok(battle_snapshot(false, None)));
        app.try_attack();
        assert!(app.gate_busy().is_none());
        assert_eq!(app.surface().enemy_cell(Coord::new(0, 0)), Some(CellPaint::Fog));
    }

    #[tokio::test]
    async fn feed_loss_degrades_to_polling() {
        let (mut app, _rx) = test_app();
        app.start(Ok(waiting_snapshot()));
        app.on_event(UiEvent::FeedLost { token: app.view_token() });
        assert_eq!(app.feed_kind(), Some(FeedKind::Poll));
        assert_eq!(app.status().unwrap().level, StatusLevel::Error);
    }

    #[tokio::test]
    async fn winner_freezes_the_screen() {
        let (mut app, _rx) = test_app();
        app.start(Ok(battle_snapshot(true, None)));
        app.on_event(UiEvent::SnapshotReady {
            token: app.view_token(),
            result: Ok(battle_snapshot(false, Some("bbbb"))),
        });

        assert_eq!(app.phase(), Phase::Ended);
        assert_eq!(app.winner(), Some("bbbb"));
        assert!(!app.won_by_me());
        // Final boards stay up under the modal, updates stop.
        assert!(app.surface().is_mounted());
        assert!(app.feed_kind().is_none());
        app.try_attack();
        assert!(app.gate_busy().is_none());
    }

    #[tokio::test]
    async fn submit_requires_a_complete_fleet() {
        let (mut app, _rx) = test_app();
        let mut snap = waiting_snapshot();
        if let Some(r) = snap.room.as_mut() {
            r.game_state = GameState::PlacingBoards;
        }
        app.start(Ok(snap));
        assert_eq!(app.phase(), Phase::Placement);

        app.placement_submit();
        assert!(app.gate_busy().is_none());
        assert_eq!(app.status().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn lobby_menu_wraps() {
        let (mut app, _rx) = test_app();
        app.lobby_move(-1);
        assert_eq!(app.lobby().selected, LOBBY_MENU.len() - 1);
        app.lobby_move(1);
        assert_eq!(app.lobby().selected, 0);
    }

    #[test]
    fn quick_match_needs_a_matchmaker_chain() {
        let (mut app, _rx) = test_app();
        app.lobby_move(2);
        app.lobby_activate();
        assert!(app.gate_busy().is_none());
        assert_eq!(app.status().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn nickname_entry_updates_the_player_name() {
        let path = scratch_path("nick");
        let session = SessionStore::load_or_create(&path).unwrap();
        let (tx, _rx) = unbounded_channel();
        let mut cfg = test_config(path.clone());
        cfg.player_name = None;
        let mut app = App::new(cfg, session, tx);

        app.lobby_move(3);
        app.lobby_activate();
        assert_eq!(app.lobby().mode, LobbyMode::EnterName);
        for c in "Grace".chars() {
            app.input_char(c);
        }
        app.lobby_activate();
        assert_eq!(app.player_name(), "Grace");
        assert_eq!(app.lobby().mode, LobbyMode::Menu);
        let _ = std::fs::remove_file(path);
    }
}
