// Terminal client binary.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use broadside::{
    app::{App, LobbyMode},
    config,
    gateway::NodeClient,
    screen::Phase,
    session::SessionStore,
    snapshot,
    types::UiEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let cfg = config::load().context("failed to load configuration")?;
    if log::log_enabled!(log::Level::Debug) {
        cfg.print_summary();
    }

    let session = SessionStore::load_or_create(&cfg.session_file)
        .context("failed to open the session file")?;

    // One authoritative read before entering the alternate screen decides
    // the first screen; a dead node lands on the startup-failure screen.
    let probe_client = NodeClient::new(&cfg.node_url, &cfg.app_id, cfg.rpc_timeout_ms);
    let probe = snapshot::fetch(&probe_client, &cfg.chain_id).await;

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // app + channel
    let (tx, rx) = unbounded_channel::<UiEvent>();
    let mut app = App::new(cfg, session, tx);
    app.start(probe);

    let result = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<UiEvent>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                }
            }
        }
        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev);
        }

        if last_frame.elapsed() >= budget {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent) {
    // Control chords work on every screen
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        match k.code {
            KeyCode::Char('c') => app.request_quit(),
            KeyCode::Char('d') => app.toggle_debug_panel(),
            _ => {}
        }
        return;
    }

    // Text entry captures printable keys before anything else
    if app.phase() == Phase::Lobby && app.lobby().mode != LobbyMode::Menu {
        match k.code {
            KeyCode::Char(c) => app.input_char(c),
            KeyCode::Backspace => app.input_backspace(),
            KeyCode::Enter => app.lobby_activate(),
            KeyCode::Esc => app.input_cancel(),
            _ => {}
        }
        return;
    }

    match app.phase() {
        Phase::Lobby => match k.code {
            KeyCode::Up | KeyCode::Char('k') => app.lobby_move(-1),
            KeyCode::Down | KeyCode::Char('j') => app.lobby_move(1),
            KeyCode::Enter => app.lobby_activate(),
            KeyCode::Char('y') => app.copy_chain_id(),
            KeyCode::Char('q') => app.request_quit(),
            _ => {}
        },
        Phase::Waiting => match k.code {
            KeyCode::Char('y') => app.copy_chain_id(),
            KeyCode::Esc => app.leave_room(),
            KeyCode::Char('q') => app.request_quit(),
            _ => {}
        },
        Phase::Placement => match k.code {
            KeyCode::Up | KeyCode::Char('k') => app.placement_move(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => app.placement_move(1, 0),
            KeyCode::Left | KeyCode::Char('h') => app.placement_move(0, -1),
            KeyCode::Right | KeyCode::Char('l') => app.placement_move(0, 1),
            KeyCode::Char('r') => app.placement_rotate(),
            KeyCode::Char(' ') | KeyCode::Enter => app.placement_place(),
            KeyCode::Char('u') => app.placement_undo(),
            KeyCode::Char('c') => app.placement_clear(),
            KeyCode::Char('x') => app.placement_randomize(),
            KeyCode::Char('s') => app.placement_submit(),
            KeyCode::Char('g') => app.request_start_game(),
            KeyCode::Esc => app.leave_room(),
            KeyCode::Char('q') => app.request_quit(),
            _ => {}
        },
        Phase::InGame => match k.code {
            KeyCode::Up | KeyCode::Char('k') => app.game_move(-1, 0),
            KeyCode::Down | KeyCode::Char('j') => app.game_move(1, 0),
            KeyCode::Left | KeyCode::Char('h') => app.game_move(0, -1),
            KeyCode::Right | KeyCode::Char('l') => app.game_move(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => app.try_attack(),
            KeyCode::Char('y') => app.copy_chain_id(),
            KeyCode::Esc => app.leave_room(),
            KeyCode::Char('q') => app.request_quit(),
            _ => {}
        },
        Phase::Ended => match k.code {
            KeyCode::Enter | KeyCode::Esc => app.leave_room(),
            KeyCode::Char('q') => app.request_quit(),
            _ => {}
        },
        Phase::InitError => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),
            _ => {}
        },
    }
}
