#![recursion_limit = "256"]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gomoku_selfplay::checkpoint::CheckpointManager;
use gomoku_selfplay::config::AppConfig;
use gomoku_selfplay::game::Player;
use gomoku_selfplay::oracle::{ScoringOracle, ValueNetOracle};
use gomoku_selfplay::store::BoardStore;
use gomoku_selfplay::training::dashboard_msg::{SelfPlayCommand, SelfPlayUpdate};
use gomoku_selfplay::training::metrics::SelfPlayStats;
use gomoku_selfplay::training::SelfPlayDriver;
use gomoku_selfplay::ui::dashboard::DashboardState;
use gomoku_selfplay::ui::{dashboard_view, App};

const LOG_FILE: &str = "selfplay.log";

/// Run five-in-a-row self-play, training a value network after every game.
/// Subcommands play interactively or manage the saved boards.
#[derive(Parser)]
#[command(name = "selfplay", about = "Gomoku self-play with a trainable move oracle")]
struct Cli {
    /// Board side length
    #[arg(long)]
    size: Option<usize>,

    /// Marks in a row needed to win
    #[arg(long)]
    win_length: Option<usize>,

    /// Player who opens the first game: x or o
    #[arg(long)]
    starting_player: Option<Player>,

    /// Number of games to play
    #[arg(long)]
    games: Option<usize>,

    /// Seed for move selection and replay sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Run without the TUI dashboard, logging progress to stdout
    #[arg(long)]
    headless: bool,

    /// Resume from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Play on the board yourself; the oracle trains on every finished game
    Play,
    /// Manage the saved-boards store
    Boards {
        #[command(subcommand)]
        action: BoardsAction,
    },
}

#[derive(Subcommand)]
enum BoardsAction {
    /// List saved board names
    List,
    /// Print a saved board
    Show { name: String },
    /// Delete a saved board
    Delete { name: String },
    /// Train the oracle on a finished saved board and checkpoint it
    Train { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_to_stdout = match cli.command {
        Some(Command::Boards { .. }) => true,
        Some(Command::Play) => false,
        None => cli.headless,
    };
    init_logging(log_to_stdout)?;

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(size) = cli.size {
        app_config.board.size = size;
    }
    if let Some(win_length) = cli.win_length {
        app_config.board.win_length = win_length;
    }
    if let Some(player) = cli.starting_player {
        app_config.board.starting_player = player;
    }
    if let Some(games) = cli.games {
        app_config.selfplay.num_games = games;
    }
    if let Some(seed) = cli.seed {
        app_config.selfplay.seed = Some(seed);
        app_config.oracle.seed = Some(seed);
    }
    app_config.validate().context("validating configuration")?;

    match cli.command {
        Some(Command::Play) => return run_play(&app_config),
        Some(Command::Boards { action }) => return run_boards(&app_config, action),
        None => {}
    }

    let board = app_config.board.build();
    let oracle = ValueNetOracle::new(app_config.oracle.clone(), app_config.board.size);
    let mut driver = SelfPlayDriver::new(board, oracle, app_config.selfplay.clone())
        .context("creating self-play driver")?
        .with_checkpoints(CheckpointManager::new(app_config.checkpoint.clone()))
        .with_store(BoardStore::open(app_config.store.path.clone()));

    if cli.resume {
        match driver.resume() {
            Ok(Some(metadata)) => info!(game = metadata.game, "resuming self-play"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "no checkpoint restored, starting fresh"),
        }
    }

    let games = app_config.selfplay.num_games;
    if cli.headless {
        let stats = driver.run(games).context("running self-play")?;
        println!(
            "games: {}  X wins: {}  O wins: {}  draws: {}",
            stats.games, stats.x_wins, stats.o_wins, stats.draws
        );
        Ok(())
    } else {
        run_dashboard(driver, games)
    }
}

fn init_logging(headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if headless {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        // stdout belongs to the TUI
        let log_file = std::fs::File::create(LOG_FILE)
            .with_context(|| format!("creating log file {LOG_FILE}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Arc::new(log_file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

/// Load the latest checkpoint into `oracle`, returning its lifetime counters.
fn restore_oracle(manager: &CheckpointManager, oracle: &mut ValueNetOracle) -> SelfPlayStats {
    match manager.restore_latest(oracle) {
        Ok(data) => {
            info!(game = data.metadata.game, path = %data.path.display(), "oracle restored");
            data.metadata.metrics.stats
        }
        Err(e) => {
            warn!(error = %e, "no checkpoint restored, oracle starts untrained");
            SelfPlayStats::default()
        }
    }
}

fn play_app(app_config: &AppConfig) -> App<ValueNetOracle> {
    let manager = CheckpointManager::new(app_config.checkpoint.clone());
    let mut oracle = ValueNetOracle::new(app_config.oracle.clone(), app_config.board.size);
    let stats = restore_oracle(&manager, &mut oracle);
    App::new(
        app_config.board.build(),
        oracle,
        BoardStore::open(app_config.store.path.clone()),
    )
    .with_checkpoints(manager)
    .with_stats(stats)
}

fn run_play(app_config: &AppConfig) -> Result<()> {
    let mut app = play_app(app_config);

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let result = app.run(&mut terminal).context("running interactive board");

    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
    result?;

    if app.oracle().games_trained() > 0 {
        if let Some(path) = app.save_checkpoint().context("saving checkpoint")? {
            info!(path = %path.display(), "checkpoint saved on exit");
        }
    }
    Ok(())
}

fn run_boards(app_config: &AppConfig, action: BoardsAction) -> Result<()> {
    let store = BoardStore::open(app_config.store.path.clone());
    match action {
        BoardsAction::List => {
            for name in store.names().context("listing saved boards")? {
                println!("{name}");
            }
        }
        BoardsAction::Show { name } => {
            let board = store.load(&name).with_context(|| format!("loading '{name}'"))?;
            println!(
                "{name}: {}x{}, {} in a row, {} moves",
                board.size(),
                board.size(),
                board.win_length(),
                board.move_count()
            );
            print!("{board}");
            match board.winner() {
                Some(p) => println!("winner: {p}"),
                None if board.status().is_terminal() => println!("draw"),
                None => println!("{} to move", board.current_player()),
            }
        }
        BoardsAction::Delete { name } => {
            if !store.delete(&name).context("deleting saved board")? {
                bail!("no saved board named '{name}'");
            }
            println!("deleted {name}");
        }
        BoardsAction::Train { name } => {
            let mut app = play_app(app_config);
            let Some(report) = app.load(&name).with_context(|| format!("loading '{name}'"))? else {
                bail!("'{name}' is not a finished game, nothing to train on");
            };
            println!(
                "trained on {name}: loss {:.6} after {} iterations",
                report.loss, report.iterations
            );
            if let Some(path) = app.save_checkpoint().context("saving checkpoint")? {
                println!("checkpoint: {}", path.display());
            }
        }
    }
    Ok(())
}

fn run_dashboard(driver: SelfPlayDriver<ValueNetOracle>, games: usize) -> Result<()> {
    let total_games = driver.stats().games + games;

    let (update_tx, update_rx) = mpsc::channel::<SelfPlayUpdate>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<SelfPlayCommand>();

    let pause = Arc::new(AtomicBool::new(false));
    let quit = Arc::new(AtomicBool::new(false));

    let pause_clone = pause.clone();
    let quit_clone = quit.clone();

    let worker = std::thread::spawn(move || {
        let mut driver = driver;
        driver.run_with_updates(games, update_tx, cmd_rx, pause_clone, quit_clone)
    });

    let ui_result = run_dashboard_ui(update_rx, cmd_tx, pause, quit.clone(), total_games);
    // Stop the worker if the UI failed before the user quit.
    quit.store(true, Ordering::Relaxed);

    let worker_result = worker
        .join()
        .map_err(|_| anyhow!("self-play thread panicked"))?;
    ui_result?;
    let stats = worker_result.context("running self-play")?;
    info!(
        games = stats.games,
        x_wins = stats.x_wins,
        o_wins = stats.o_wins,
        draws = stats.draws,
        "dashboard closed"
    );
    Ok(())
}

fn run_dashboard_ui(
    update_rx: mpsc::Receiver<SelfPlayUpdate>,
    cmd_tx: mpsc::Sender<SelfPlayCommand>,
    pause: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
    total_games: usize,
) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let mut dashboard = DashboardState::new(total_games);
    let frame_duration = Duration::from_millis(100);

    let result = loop {
        while let Ok(update) = update_rx.try_recv() {
            dashboard.apply(update);
        }

        if let Err(e) = terminal.draw(|f| dashboard_view::render(f, &dashboard)) {
            break Err(anyhow::Error::new(e).context("drawing dashboard"));
        }

        if event::poll(frame_duration).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => {
                        quit.store(true, Ordering::Relaxed);
                        break Ok(());
                    }
                    KeyCode::Char('p') | KeyCode::Char('P') => {
                        let paused = dashboard.toggle_pause();
                        pause.store(paused, Ordering::Relaxed);
                    }
                    KeyCode::Char('s') | KeyCode::Char('S') => {
                        let _ = cmd_tx.send(SelfPlayCommand::SaveCheckpoint);
                    }
                    _ => {}
                }
            }
        }
    };

    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
    result
}
