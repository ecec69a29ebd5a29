use log::{debug, error};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::types::{Category, QuizConfig, QuizSummary, Theme};
use crate::view::{LeaderboardRow, QuestionView, ReviewItem, TimerLevel};

pub type EventTx = mpsc::UnboundedSender<QuizEvent>;
pub type EventRx = mpsc::UnboundedReceiver<QuizEvent>;

/// Everything the presentation layer is told. The core never asks it anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum QuizEvent {
    #[serde(rename_all = "camelCase")]
    SetupReady { theme: Theme, defaults: QuizConfig },

    #[serde(rename_all = "camelCase")]
    Loading { config: QuizConfig },

    #[serde(rename_all = "camelCase")]
    FetchFailed { message: String },

    #[serde(rename_all = "camelCase")]
    QuestionChanged { question: QuestionView },

    #[serde(rename_all = "camelCase")]
    TimerTick {
        seconds_remaining: u32,
        level: TimerLevel,
    },

    TimeUp,

    #[serde(rename_all = "camelCase")]
    AnswerScored {
        is_correct: bool,
        selected_answer: Option<String>,
        correct_answer: String,
        time_spent: u64,
        score: u32,
        streak: u32,
    },

    #[serde(rename_all = "camelCase")]
    LifelineUsed {
        eliminated: Vec<String>,
        lifelines_remaining: u32,
    },

    Paused,
    Resumed,

    #[serde(rename_all = "camelCase")]
    QuizFinished {
        summary: QuizSummary,
        made_leaderboard: bool,
    },

    #[serde(rename_all = "camelCase")]
    LeaderboardUpdated { rows: Vec<LeaderboardRow> },

    #[serde(rename_all = "camelCase")]
    Review { items: Vec<ReviewItem> },

    #[serde(rename_all = "camelCase")]
    Categories { categories: Vec<Category> },

    #[serde(rename_all = "camelCase")]
    ThemeChanged { theme: Theme },

    /// The quiz was quit or a new one is being set up.
    ReturnedToSetup,

    #[serde(rename_all = "camelCase")]
    Rejected { message: String },
}

impl QuizEvent {
    pub fn rejected(message: impl Into<String>) -> Self {
        QuizEvent::Rejected {
            message: message.into(),
        }
    }
}

pub fn send_event(tx: &EventTx, event: QuizEvent) {
    debug!("Emitting event: {event:?}");
    tx.send(event).unwrap_or_else(|e| {
        error!("Sending quiz event through channel failed: {e}");
    })
}
