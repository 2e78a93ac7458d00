mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use reconquest_games::api::ApiClient;
use reconquest_games::config::{load_settings, project_paths, save_settings_atomic, Settings};
use reconquest_games::controller::{Input, MatchController, Notice};
use reconquest_games::entities::{Phase, Playfield};
use reconquest_games::quiz::{default_bank, load_bank, QuizPhase, TriviaQuiz};
use reconquest_games::reward::{BackgroundSubmitter, SubmissionResult};

use display::{item_col, item_row, play_bottom, CatchView, BASKET_WIDTH};

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// How long a toast stays on screen.
const TOAST_TTL: Duration = Duration::from_millis(1500);

/// Pause on an answered question before moving on.
const ANSWER_REVEAL: Duration = Duration::from_millis(1500);

type CatchGame = MatchController<BackgroundSubmitter<ApiClient>, StdRng>;
type Quiz = TriviaQuiz<BackgroundSubmitter<ApiClient>, StdRng>;
type RewardResults = mpsc::Receiver<SubmissionResult>;

enum MenuResult {
    Catch,
    Trivia,
    Quit,
}

/// Background reward results, one channel per mini-game.
struct Rewards {
    game: RewardResults,
    quiz: RewardResults,
}

/// Where a mini-game loop hands control back to.
enum Exit {
    Menu,
    Quit,
}

fn is_quit(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
}

fn is_back(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Esc)
}

fn playfield_for(width: u16, height: u16) -> Playfield {
    Playfield {
        width: width.saturating_sub(2) as f32,
        height: play_bottom(height).saturating_sub(display::PLAY_TOP) as f32,
    }
}

fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::Points(p) if *p > 10 => format!("+{} points! ✨", p),
        Notice::Points(p) if *p > 0 => format!("+{}", p),
        Notice::Points(p) => format!("{}", p),
        Notice::FeverStarted => "🔥 FEVER MODE! Points x2".to_string(),
        Notice::MagnetActivated => "🧲 Magnet on for 3 seconds!".to_string(),
        Notice::TimeExtended => "🚀 +5 seconds".to_string(),
        Notice::FatalCaught => "😾 The angry cat! Game over".to_string(),
        Notice::NewHighScore(s) => format!("🏆 New personal best: {}", s),
        Notice::RewardSubmitting => "Saving your result…".to_string(),
        Notice::RewardGranted(_) => "🎉 You earned stars ⭐".to_string(),
        Notice::RewardFailed(e) => format!("Could not grant stars: {}", e),
        Notice::RewardAlreadyClaimed => "Stars already granted".to_string(),
        Notice::BelowThreshold { missing } => format!("{} more points needed for stars", missing),
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    api: &ApiClient,
    high_score: u32,
) -> Result<MenuResult> {
    let status = match api.status() {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("could not load dashboard status: {e}");
            None
        }
    };

    loop {
        let (width, height) = terminal::size()?;
        display::render_menu(out, width, height, status.as_ref(), high_score)?;

        match rx.recv().context("input thread stopped")? {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('1') => return Ok(MenuResult::Catch),
                KeyCode::Char('2') => return Ok(MenuResult::Trivia),
                KeyCode::Esc => return Ok(MenuResult::Quit),
                _ if is_quit(code, modifiers) => return Ok(MenuResult::Quit),
                _ => {}
            },
            _ => {}
        }
    }
}

// ── Catch game ────────────────────────────────────────────────────────────────

fn engine_now(origin: Instant) -> u64 {
    origin.elapsed().as_millis() as u64
}

/// Catch the lowest item hanging over the basket.
fn basket_catch(game: &mut CatchGame, basket_col: u16, height: u16) {
    let now = game.now();
    let target = game
        .state()
        .items
        .iter()
        .filter(|item| {
            let left = item_col(item);
            left + 3 > basket_col && left < basket_col + BASKET_WIDTH
        })
        .max_by_key(|item| item_row(item, now, height))
        .map(|item| item.id);
    if let Some(id) = target {
        game.apply(Input::Catch(id));
    }
}

/// Catch whatever item is drawn under the mouse pointer.
fn click_catch(game: &mut CatchGame, col: u16, row: u16, height: u16) {
    let now = game.now();
    let target = game
        .state()
        .items
        .iter()
        .find(|item| {
            let left = item_col(item);
            let item_r = item_row(item, now, height);
            col >= left && col < left + 3 && row.abs_diff(item_r) <= 1
        })
        .map(|item| item.id);
    if let Some(id) = target {
        game.apply(Input::Catch(id));
    }
}

fn catch_loop<W: Write>(
    out: &mut W,
    game: &mut CatchGame,
    rx: &mpsc::Receiver<Event>,
    rewards: &RewardResults,
    origin: Instant,
) -> Result<Exit> {
    let (mut width, mut height) = terminal::size()?;
    game.apply(Input::Advance { now: engine_now(origin) });
    game.apply(Input::Resize(playfield_for(width, height)));
    game.apply(Input::Start);

    let mut basket_col: u16 = width / 2;
    let mut toasts: Vec<(String, Instant)> = Vec::new();

    loop {
        let frame_start = Instant::now();
        game.apply(Input::Advance { now: engine_now(origin) });
        while let Ok(done) = rewards.try_recv() {
            game.apply(Input::RewardResult(done));
        }

        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press | KeyEventKind::Repeat,
                    ..
                }) => {
                    if is_quit(code, modifiers) {
                        return Ok(Exit::Quit);
                    }
                    if is_back(code) {
                        game.apply(Input::Back);
                        return Ok(Exit::Menu);
                    }
                    match code {
                        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                            basket_col = basket_col.saturating_sub(2).max(1);
                        }
                        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                            basket_col = (basket_col + 2)
                                .min(width.saturating_sub(BASKET_WIDTH + 1));
                        }
                        KeyCode::Char(' ') => basket_catch(game, basket_col, height),
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if game.phase() == Phase::GameOver =>
                        {
                            game.apply(Input::PlayAgain);
                        }
                        KeyCode::Char('s') | KeyCode::Char('S')
                            if game.phase() == Phase::GameOver =>
                        {
                            game.apply(Input::RetryReward);
                        }
                        _ => {}
                    }
                }
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => click_catch(game, column, row, height),
                Event::Resize(w, h) => {
                    width = w;
                    height = h;
                    game.apply(Input::Resize(playfield_for(w, h)));
                }
                _ => {}
            }
        }

        for notice in game.drain_notices() {
            toasts.push((notice_text(&notice), Instant::now() + TOAST_TTL));
        }
        let now = Instant::now();
        toasts.retain(|(_, until)| *until > now);
        let texts: Vec<String> = toasts.iter().rev().take(3).map(|(t, _)| t.clone()).collect();

        display::render_catch(
            out,
            &CatchView {
                state: game.state(),
                now: game.now(),
                magnet_active: game.magnet_active(),
                basket_col,
                toasts: &texts,
                width,
                height,
            },
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Trivia ────────────────────────────────────────────────────────────────────

fn quiz_loop<W: Write>(
    out: &mut W,
    quiz: &mut Quiz,
    rx: &mpsc::Receiver<Event>,
    rewards: &RewardResults,
) -> Result<Exit> {
    quiz.reset();
    let mut answered_at: Option<Instant> = None;

    loop {
        let frame_start = Instant::now();
        while let Ok(done) = rewards.try_recv() {
            quiz.settle_reward(done);
        }

        if let Some(at) = answered_at {
            if at.elapsed() >= ANSWER_REVEAL {
                answered_at = None;
                if let Err(e) = quiz.next() {
                    log::debug!("quiz advance ignored: {e}");
                }
            }
        }

        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = ev
            else {
                continue;
            };
            if is_quit(code, modifiers) {
                return Ok(Exit::Quit);
            }
            if is_back(code) {
                quiz.reset();
                return Ok(Exit::Menu);
            }
            match (quiz.phase(), code) {
                (QuizPhase::Idle | QuizPhase::Finished, KeyCode::Enter) => {
                    answered_at = None;
                    quiz.start();
                }
                (QuizPhase::Asking { selected: None, .. }, KeyCode::Char(c)) => {
                    let digit = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1));
                    if let Some(option) = digit {
                        match quiz.answer(option) {
                            Ok(_) => answered_at = Some(Instant::now()),
                            Err(e) => log::debug!("answer rejected: {e}"),
                        }
                    }
                }
                (QuizPhase::Finished, KeyCode::Char('s') | KeyCode::Char('S')) => {
                    quiz.retry_reward();
                }
                _ => {}
            }
        }

        let (width, height) = terminal::size()?;
        display::render_quiz(out, quiz, width, height)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn rng_from(settings: &Settings) -> StdRng {
    match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn main() -> Result<()> {
    let paths = project_paths()?;
    init_logging(&paths.log_path)?;
    let settings = load_settings(&paths.settings_path);
    log::info!("settings loaded from {}", paths.settings_path.display());
    if !paths.settings_path.exists() {
        // First run: leave an editable copy of the defaults behind.
        if let Err(e) = save_settings_atomic(&paths.settings_path, &settings) {
            log::warn!("could not write default settings: {e:#}");
        }
    }

    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let api = ApiClient::new(&settings.api_base_url, timeout).context("building API client")?;
    let (game_submitter, game_rewards) =
        BackgroundSubmitter::new(ApiClient::new(&settings.api_base_url, timeout)?);
    let mut game = MatchController::new(
        settings.tuning.clone(),
        game_submitter,
        rng_from(&settings),
    );
    let bank = match &settings.quiz_bank {
        Some(path) => load_bank(path).with_context(|| format!("loading {}", path.display()))?,
        None => default_bank(),
    };
    let (quiz_submitter, quiz_rewards) =
        BackgroundSubmitter::new(ApiClient::new(&settings.api_base_url, timeout)?);
    let mut quiz = TriviaQuiz::new(
        bank,
        settings.quiz.clone(),
        quiz_submitter,
        rng_from(&settings),
    )?;
    let rewards = Rewards {
        game: game_rewards,
        quiz: quiz_rewards,
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &rewards, &api, &mut game, &mut quiz);

    // Always restore the terminal
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    rewards: &Rewards,
    api: &ApiClient,
    game: &mut CatchGame,
    quiz: &mut Quiz,
) -> Result<()> {
    let origin = Instant::now();
    loop {
        let exit = match show_menu(out, rx, api, game.state().high_score)? {
            MenuResult::Quit => break,
            MenuResult::Catch => catch_loop(out, game, rx, &rewards.game, origin)?,
            MenuResult::Trivia => quiz_loop(out, quiz, rx, &rewards.quiz)?,
        };
        if let Exit::Quit = exit {
            break;
        }
    }
    Ok(())
}
