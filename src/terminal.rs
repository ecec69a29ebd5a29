//! Line-oriented terminal front end: commands in on stdin, events out on stdout.

use std::io::{BufRead, Write};

use log::{error, info};

use crate::app::ActionTx;
use crate::model::action::PlayerAction;
use crate::model::event::{EventRx, QuizEvent};
use crate::model::types::{Difficulty, QuizConfig, Theme};
use crate::view::{TimerLevel, format_time};

pub const HELP: &str = "\
Commands:
  start [amount=N] [time=N] [category=ID] [difficulty=easy|medium|hard]
  1-9          pick an option          answer TEXT  answer by text
  pause | p    resume | r              skip | s     fifty | f (50:50)
  quit | q     abandon the quiz        new          back to setup after results
  review       answers of the last quiz
  leaderboard  clear                   theme        categories
  help         exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(PlayerAction),
    Help,
}

fn parse_start(args: &[&str], defaults: &QuizConfig) -> Result<PlayerAction, String> {
    let mut config = defaults.clone();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            return Err(format!("Expected key=value, got {arg:?}"));
        };
        let number = || {
            value
                .parse::<u32>()
                .map_err(|_| format!("{key} must be a number, got {value:?}"))
        };
        match key {
            "amount" | "n" => config.amount = number()?,
            "time" | "t" => config.time_limit = number()?,
            "category" | "c" => config.category = Some(number()?),
            "difficulty" | "d" => {
                config.difficulty = Some(
                    Difficulty::parse(value)
                        .ok_or_else(|| format!("Unknown difficulty {value:?}"))?,
                )
            }
            other => return Err(format!("Unknown setting {other:?}")),
        }
    }
    config.validate()?;
    Ok(PlayerAction::StartQuiz { config })
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_command(line: &str, defaults: &QuizConfig) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = line.parse::<usize>() {
        if n == 0 {
            return Err("Options are numbered from 1".to_string());
        }
        return Ok(Some(Command::Action(PlayerAction::SelectOption {
            index: n - 1,
        })));
    }

    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default().to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    let action = match head.as_str() {
        "start" => parse_start(&rest, defaults)?,
        "answer" => PlayerAction::SubmitAnswer {
            answer: Some(rest.join(" ")),
        },
        "pause" | "p" => PlayerAction::Pause,
        "resume" | "r" => PlayerAction::Resume,
        "skip" | "s" => PlayerAction::Skip,
        "fifty" | "f" | "50:50" | "5050" => PlayerAction::UseLifeline,
        "quit" | "q" => PlayerAction::Quit,
        "new" => PlayerAction::NewQuiz,
        "review" => PlayerAction::ShowReview,
        "leaderboard" | "lb" => PlayerAction::ShowLeaderboard,
        "clear" => PlayerAction::ClearLeaderboard,
        "theme" => PlayerAction::ToggleTheme,
        "categories" => PlayerAction::ListCategories,
        "exit" => PlayerAction::Exit,
        "help" | "h" | "?" => return Ok(Some(Command::Help)),
        other => return Err(format!("Unknown command {other:?}, try 'help'")),
    };
    Ok(Some(Command::Action(action)))
}

/// Actions the player has to confirm first.
pub fn confirmation_prompt(action: &PlayerAction) -> Option<&'static str> {
    match action {
        PlayerAction::Skip => Some("Are you sure you want to skip this question? [y/N] "),
        PlayerAction::Quit => Some("Are you sure you want to quit the quiz? [y/N] "),
        PlayerAction::ClearLeaderboard => {
            Some("Are you sure you want to clear the leaderboard? [y/N] ")
        }
        _ => None,
    }
}

/// Read commands until EOF or `exit`, forwarding actions to the quiz loop.
/// Blocking; run it on its own thread.
pub fn read_commands<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    actions: ActionTx,
    defaults: QuizConfig,
) {
    let mut lines = input.lines();
    while let Some(Ok(line)) = lines.next() {
        let command = match parse_command(&line, &defaults) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                let _ = writeln!(output, "{message}");
                continue;
            }
        };
        let action = match command {
            Command::Help => {
                let _ = writeln!(output, "{HELP}");
                continue;
            }
            Command::Action(action) => action,
        };

        if let Some(prompt) = confirmation_prompt(&action) {
            let _ = write!(output, "{prompt}");
            let _ = output.flush();
            let confirmed = matches!(
                lines.next(),
                Some(Ok(answer)) if answer.trim().to_ascii_lowercase().starts_with('y')
            );
            if !confirmed {
                continue;
            }
        }

        let exit = action == PlayerAction::Exit;
        if actions.send(action).is_err() {
            error!("Quiz loop stopped, no longer reading input");
            break;
        }
        if exit {
            break;
        }
    }
    info!("Input closed");
    // Let the quiz loop wind down if the input ended without `exit`
    let _ = actions.send(PlayerAction::Exit);
}

fn paint(text: &str, level: TimerLevel, theme: Theme) -> String {
    let code = match (level, theme) {
        (TimerLevel::Normal, _) => return text.to_string(),
        (TimerLevel::Warning, Theme::Light) => "33",
        (TimerLevel::Warning, Theme::Dark) => "93",
        (TimerLevel::Danger, Theme::Light) => "31",
        (TimerLevel::Danger, Theme::Dark) => "91",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn good(text: &str, theme: Theme) -> String {
    let code = match theme {
        Theme::Light => "32",
        Theme::Dark => "92",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

/// Text for one event, or `None` for events with nothing to show.
pub fn render(event: &QuizEvent, theme: Theme) -> Option<String> {
    let text = match event {
        QuizEvent::SetupReady { defaults, .. } => format!(
            "Trivia quiz. Type 'start' for {} questions with {}s each, or 'help'.",
            defaults.amount, defaults.time_limit
        ),
        QuizEvent::Loading { config } => format!("Loading {} questions...", config.amount),
        QuizEvent::FetchFailed { message } => format!(
            "Failed to load questions: {message}. Please check your internet connection and try again."
        ),
        QuizEvent::QuestionChanged { question } => {
            let mut out = format!(
                "\nQuestion {} of {}  [{} | {}]  Streak: {}  ({}% done)\n{}\n",
                question.number,
                question.total,
                question.category,
                question.difficulty,
                question.streak,
                question.progress,
                question.text
            );
            for (i, option) in question.options.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, option));
            }
            out.push_str(&format!(
                "{}s | 50:50: {} remaining",
                question.seconds_remaining, question.lifelines_remaining
            ));
            out
        }
        QuizEvent::TimerTick {
            seconds_remaining,
            level,
        } => {
            // Only announce when it starts to matter
            if *level == TimerLevel::Normal && seconds_remaining % 10 != 0 {
                return None;
            }
            paint(&format!("{seconds_remaining}s left"), *level, theme)
        }
        QuizEvent::TimeUp => paint("Time's up!", TimerLevel::Danger, theme),
        QuizEvent::AnswerScored {
            is_correct,
            correct_answer,
            time_spent,
            streak,
            ..
        } => {
            let verdict = if *is_correct {
                good("✓ Correct! Great job! Keep up the good work.", theme)
            } else {
                paint(
                    &format!("✗ Incorrect. The correct answer was: {correct_answer}"),
                    TimerLevel::Danger,
                    theme,
                )
            };
            format!("{verdict}\nTime: {time_spent}s  Streak: {streak}")
        }
        QuizEvent::LifelineUsed {
            eliminated,
            lifelines_remaining,
        } => format!(
            "50:50 used. Eliminated: {}. {} remaining.",
            eliminated.join(", "),
            lifelines_remaining
        ),
        QuizEvent::Paused => "Quiz paused. Type 'resume' to continue.".to_string(),
        QuizEvent::Resumed => "Quiz resumed.".to_string(),
        QuizEvent::QuizFinished {
            summary,
            made_leaderboard,
        } => {
            let mut out = format!(
                "\nQuiz complete! Score: {}/{}  Accuracy: {}%\nTotal time: {}  Average: {}s  Best streak: {}\nBadge: {}\n",
                summary.score,
                summary.total,
                summary.accuracy,
                format_time(summary.total_time),
                summary.average_time,
                summary.best_streak,
                summary.badge
            );
            if summary.weak_areas.is_empty() {
                out.push_str("Great job! No weak areas identified.");
            } else {
                out.push_str("Areas for improvement:");
                for area in &summary.weak_areas {
                    out.push_str(&format!(
                        "\n  {}: {}% accuracy",
                        area.category,
                        area.accuracy.round()
                    ));
                }
            }
            if *made_leaderboard {
                out.push_str("\nNew leaderboard entry!");
            }
            out
        }
        QuizEvent::LeaderboardUpdated { rows } => {
            if rows.is_empty() {
                "Leaderboard: no scores yet. Be the first!".to_string()
            } else {
                let mut out = "Leaderboard:".to_string();
                for row in rows {
                    out.push_str(&format!(
                        "\n  #{} {}  {} • Avg: {}s • Streak: {} • {}",
                        row.rank,
                        row.headline(),
                        row.badge,
                        row.average_time,
                        row.best_streak,
                        row.date
                    ));
                }
                out
            }
        }
        QuizEvent::Review { items } => {
            let mut out = String::new();
            for item in items {
                out.push_str(&format!("{}. {}\n", item.number, item.question));
                for option in &item.options {
                    let mark = match (option.is_correct, option.was_selected) {
                        (true, true) => " ✓ (Your answer)",
                        (true, false) => " ✓",
                        (false, true) => " ✗ (Your answer)",
                        (false, false) => "",
                    };
                    out.push_str(&format!("   {}{}\n", option.text, mark));
                }
                out.push_str(&format!(
                    "   Category: {}  Time: {}s  {}\n",
                    item.category,
                    item.time_spent,
                    if item.is_correct { "Correct" } else { "Incorrect" }
                ));
            }
            out
        }
        QuizEvent::Categories { categories } => {
            let mut out = "Categories:".to_string();
            for category in categories {
                out.push_str(&format!("\n  {:>3}  {}", category.id, category.name));
            }
            out
        }
        QuizEvent::ThemeChanged { theme } => format!("Switched to {} theme", theme.as_str()),
        QuizEvent::ReturnedToSetup => "Ready to start a new quiz. Type 'start'.".to_string(),
        QuizEvent::Rejected { message } => message.clone(),
    };
    Some(text)
}

/// Print events until the quiz loop hangs up.
pub async fn print_events(mut events: EventRx) {
    let mut theme = Theme::default();
    while let Some(event) = events.recv().await {
        match &event {
            QuizEvent::SetupReady { theme: t, .. } | QuizEvent::ThemeChanged { theme: t } => {
                theme = *t;
            }
            _ => {}
        }
        if let Some(text) = render(&event, theme) {
            println!("{text}");
        }
    }
}
