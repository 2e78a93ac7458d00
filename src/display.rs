/// Rendering layer — all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// engine state.  No game logic is performed; this module only translates
/// state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use rand::Rng;
use reconquest_games::api::Status;
use reconquest_games::entities::{ColorTag, FallingItem, ItemKind, MatchState, Millis, Phase};
use reconquest_games::quiz::{QuizPhase, TriviaQuiz};
use reconquest_games::reward::{RewardOutcome, RewardSubmitter};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkMagenta;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_TIME: Color = Color::Cyan;
const C_FEVER: Color = Color::Red;
const C_MAGNET: Color = Color::Magenta;
const C_BASKET: Color = Color::White;
const C_TOAST: Color = Color::White;
const C_HINT: Color = Color::DarkGrey;
const C_TITLE: Color = Color::Magenta;

/// Width of the basket the keyboard player moves along the bottom row.
pub const BASKET_WIDTH: u16 = 5;

/// First and last playfield rows (inside the border).
pub const PLAY_TOP: u16 = 2;

pub fn play_bottom(height: u16) -> u16 {
    height.saturating_sub(4)
}

/// Screen row of an item at `now`.
pub fn item_row(item: &FallingItem, now: Millis, height: u16) -> u16 {
    let span = play_bottom(height).saturating_sub(PLAY_TOP) as f32;
    PLAY_TOP + (item.fall_progress(now) * span).round() as u16
}

/// Screen column of an item's left edge.
pub fn item_col(item: &FallingItem) -> u16 {
    1 + item.x.max(0.0).round() as u16
}

fn item_color(kind: ItemKind) -> Color {
    match kind {
        ItemKind::PositiveSmall => Color::Magenta,
        ItemKind::PositiveLarge => Color::Yellow,
        ItemKind::Negative => Color::DarkGrey,
        ItemKind::Fatal => Color::Red,
        ItemKind::Magnet => Color::Blue,
        ItemKind::TimeBonus => Color::Cyan,
    }
}

fn particle_color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Pink => Color::Magenta,
        ColorTag::Gold => Color::Yellow,
        ColorTag::Grey => Color::DarkGrey,
        ColorTag::Red => Color::Red,
        ColorTag::Violet => Color::Blue,
        ColorTag::Amber => Color::DarkYellow,
    }
}

fn centered<W: Write>(
    out: &mut W,
    width: u16,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = (width / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

fn finish<W: Write>(out: &mut W, height: u16) -> std::io::Result<()> {
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()
}

// ── Menu ──────────────────────────────────────────────────────────────────────

pub fn render_menu<W: Write>(
    out: &mut W,
    width: u16,
    height: u16,
    status: Option<&Status>,
    high_score: u32,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let cy = height / 2;

    centered(out, width, cy.saturating_sub(6), "♥  RECONQUEST  ♥", C_TITLE)?;

    let counters = match status {
        Some(s) => format!("Points: {}   Stars: {}⭐", s.consideration_points, s.stars),
        None => "Rewards service offline".to_string(),
    };
    centered(out, width, cy.saturating_sub(4), &counters, Color::Yellow)?;
    if high_score > 0 {
        let best = format!("Best catch score: {}", high_score);
        centered(out, width, cy.saturating_sub(3), &best, Color::Yellow)?;
    }

    let options: &[(&str, &str, Color)] = &[
        ("1", "Catch the cat — 150 points earns stars", Color::Magenta),
        ("2", "Trivia        — 3 right answers earn stars", Color::Cyan),
        ("Q", "Quit", Color::DarkGrey),
    ];
    for (i, (key, label, color)) in options.iter().enumerate() {
        let row = cy.saturating_sub(1) + i as u16;
        out.queue(cursor::MoveTo((width / 2).saturating_sub(22), row))?;
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(format!("[{}] ", key)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*label))?;
    }

    let legend: &[(ItemKind, &str)] = &[
        (ItemKind::PositiveSmall, " +5"),
        (ItemKind::PositiveLarge, " +20"),
        (ItemKind::Negative, " -10"),
        (ItemKind::Fatal, " game over"),
        (ItemKind::Magnet, " magnet 3s"),
        (ItemKind::TimeBonus, " +5s"),
    ];
    out.queue(cursor::MoveTo((width / 2).saturating_sub(22), cy + 3))?;
    for (kind, desc) in legend {
        out.queue(style::SetForegroundColor(item_color(*kind)))?;
        out.queue(Print(kind.spec().glyph))?;
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(format!("{}  ", desc)))?;
    }

    finish(out, height)
}

// ── Catch game ────────────────────────────────────────────────────────────────

pub struct CatchView<'a> {
    pub state: &'a MatchState,
    pub now: Millis,
    pub magnet_active: bool,
    pub basket_col: u16,
    pub toasts: &'a [String],
    pub width: u16,
    pub height: u16,
}

pub fn render_catch<W: Write>(out: &mut W, view: &CatchView) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view.width, view.height)?;
    draw_hud(out, view)?;

    for item in &view.state.items {
        let row = item_row(item, view.now, view.height);
        out.queue(cursor::MoveTo(item_col(item), row))?;
        out.queue(style::SetForegroundColor(item_color(item.kind)))?;
        out.queue(Print(format!("({})", item.kind.spec().glyph)))?;
    }

    for p in &view.state.particles {
        let age = view.now.saturating_sub(p.born_at) as f32 / 250.0;
        let (dx, dy) = (p.angle.to_radians().cos() * age * 2.0, p.angle.to_radians().sin() * age);
        let col = (1.0 + p.x + dx).max(1.0) as u16;
        let row = (PLAY_TOP as f32 + p.y + dy).max(PLAY_TOP as f32) as u16;
        if col < view.width.saturating_sub(1) && row <= play_bottom(view.height) {
            out.queue(cursor::MoveTo(col, row))?;
            out.queue(style::SetForegroundColor(particle_color(p.color)))?;
            out.queue(Print("·"))?;
        }
    }

    if view.state.phase == Phase::Playing {
        out.queue(cursor::MoveTo(view.basket_col, play_bottom(view.height) + 1))?;
        out.queue(style::SetForegroundColor(C_BASKET))?;
        out.queue(Print("\\___/"))?;
    }

    for (i, toast) in view.toasts.iter().enumerate() {
        centered(out, view.width, PLAY_TOP + 1 + i as u16, toast, C_TOAST)?;
    }

    out.queue(cursor::MoveTo(1, view.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("Click a cat, or ← → + SPACE with the basket   B : Back   Q : Quit"))?;

    if view.state.phase == Phase::GameOver {
        draw_game_over(out, view)?;
    }

    finish(out, view.height)
}

fn draw_border<W: Write>(out: &mut W, width: u16, height: u16) -> std::io::Result<()> {
    let w = width as usize;
    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, height.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..height.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

fn draw_hud<W: Write>(out: &mut W, view: &CatchView) -> std::io::Result<()> {
    let s = view.state;

    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>4}  Best: {:>4}", s.score, s.high_score)))?;

    let mut badges = String::new();
    if s.fever_active {
        badges.push_str("🔥 FEVER x2 ");
    }
    if view.magnet_active {
        badges.push_str("🧲 MAGNET ");
    }
    if s.combo > 1 {
        badges.push_str(&format!("combo {}", s.combo));
    }
    let color = if s.fever_active {
        C_FEVER
    } else if view.magnet_active {
        C_MAGNET
    } else {
        C_HUD_SCORE
    };
    centered(out, view.width, 0, &badges, color)?;

    let time_text = format!("Time: {:>2}s", s.time_remaining);
    let rx = view.width.saturating_sub(time_text.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(&time_text))?;
    Ok(())
}

fn draw_game_over<W: Write>(out: &mut W, view: &CatchView) -> std::io::Result<()> {
    let score_line = format!("Final Score: {}", view.state.score);
    let reward_line = if view.state.reward_claimed {
        "Stars earned ⭐".to_string()
    } else {
        "No stars this time".to_string()
    };
    let lines: &[(&str, Color)] = &[
        ("╔══════════════════╗", Color::Magenta),
        ("║    GAME  OVER    ║", Color::Magenta),
        ("╚══════════════════╝", Color::Magenta),
        (&score_line, Color::Yellow),
        (&reward_line, Color::Yellow),
        ("R - Play Again  S - Retry Stars  B - Back", Color::White),
    ];

    let start_row = (view.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        centered(out, view.width, start_row + i as u16, msg, *color)?;
    }
    Ok(())
}

// ── Trivia ────────────────────────────────────────────────────────────────────

pub fn render_quiz<W: Write, S: RewardSubmitter, R: Rng>(
    out: &mut W,
    quiz: &TriviaQuiz<S, R>,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let cy = height / 2;

    match quiz.phase() {
        QuizPhase::Idle => {
            centered(out, width, cy.saturating_sub(2), "Trivia about us", C_TITLE)?;
            let rule = format!(
                "Answer {} questions. Get {} or more right to earn stars ⭐",
                quiz.rules().questions_per_round,
                quiz.rules().pass_mark
            );
            centered(out, width, cy, &rule, Color::White)?;
            centered(out, width, cy + 2, "ENTER : Start   B : Back", C_HINT)?;
        }
        QuizPhase::Asking { index, selected } => {
            let Some(q) = quiz.current() else {
                return finish(out, height);
            };
            let header = format!("Question {} of {}", index + 1, quiz.round_len());
            centered(out, width, cy.saturating_sub(5), &header, C_HINT)?;
            centered(out, width, cy.saturating_sub(3), &q.prompt, Color::White)?;
            for (i, option) in q.options.iter().enumerate() {
                let color = match selected {
                    Some(_) if i == q.correct => Color::Green,
                    Some(s) if s == i => Color::Red,
                    _ => Color::Cyan,
                };
                let row = cy.saturating_sub(1) + i as u16;
                out.queue(cursor::MoveTo((width / 2).saturating_sub(16), row))?;
                out.queue(style::SetForegroundColor(color))?;
                out.queue(Print(format!("[{}] {}", i + 1, option)))?;
            }
            let hint = if selected.is_some() { "…" } else { "1-4 : Answer   B : Back" };
            centered(out, width, cy + 5, hint, C_HINT)?;
        }
        QuizPhase::Finished => {
            let summary = format!(
                "You got {} of {} right",
                quiz.correct_count(),
                quiz.round_len()
            );
            centered(out, width, cy.saturating_sub(2), &summary, Color::Yellow)?;
            let verdict = match quiz.last_reward() {
                Some(RewardOutcome::Granted(_)) => "Stars earned ⭐".to_string(),
                Some(RewardOutcome::Failed(e)) => format!("Could not save the result: {}", e),
                Some(RewardOutcome::Pending { .. }) => "Saving your result…".to_string(),
                Some(RewardOutcome::AlreadyClaimed) => "Stars already earned ⭐".to_string(),
                Some(RewardOutcome::BelowThreshold { missing }) => {
                    format!("{} more right answers needed for stars", missing)
                }
                None => String::new(),
            };
            centered(out, width, cy, &verdict, Color::White)?;
            let hint = "ENTER : Play Again   S : Retry Stars   B : Back";
            centered(out, width, cy + 2, hint, C_HINT)?;
        }
    }

    finish(out, height)
}
