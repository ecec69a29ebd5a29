//! Plain data handed to whatever renders the quiz. Nothing here formats for a
//! particular screen beyond short strings every front end shares.

use serde::{Deserialize, Serialize};

use crate::model::quiz::QuizSession;
use crate::model::types::{AnsweredRecord, Badge, Difficulty, LeaderboardEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub options: Vec<String>,
    pub streak: u32,
    /// Percent of questions already answered.
    pub progress: u32,
    pub lifelines_remaining: u32,
    pub seconds_remaining: u32,
}

impl QuestionView {
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let question = session.current_question()?;
        let total = session.total();
        Some(Self {
            number: session.current_index() + 1,
            total,
            text: question.text.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty,
            options: session
                .available_answers()
                .into_iter()
                .map(str::to_string)
                .collect(),
            streak: session.streak(),
            progress: (session.current_index() * 100 / total.max(1)) as u32,
            lifelines_remaining: session.lifelines_remaining(),
            seconds_remaining: session.time_limit(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerLevel {
    Normal,
    Warning,
    Danger,
}

impl TimerLevel {
    pub fn for_seconds(seconds_remaining: u32) -> Self {
        match seconds_remaining {
            0..=5 => TimerLevel::Danger,
            6..=10 => TimerLevel::Warning,
            _ => TimerLevel::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOption {
    pub text: String,
    pub is_correct: bool,
    pub was_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub number: usize,
    pub question: String,
    pub options: Vec<ReviewOption>,
    pub category: String,
    pub time_spent: u64,
    pub is_correct: bool,
}

pub fn review_items(answers: &[AnsweredRecord]) -> Vec<ReviewItem> {
    answers
        .iter()
        .enumerate()
        .map(|(i, answer)| ReviewItem {
            number: i + 1,
            question: answer.question.clone(),
            options: answer
                .all_answers
                .iter()
                .map(|option| ReviewOption {
                    text: option.clone(),
                    is_correct: *option == answer.correct_answer,
                    was_selected: answer.selected_answer.as_ref() == Some(option),
                })
                .collect(),
            category: answer.category.clone(),
            time_spent: answer.time_spent,
            is_correct: answer.is_correct,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: usize,
    pub score: u32,
    pub total: u32,
    pub accuracy: u32,
    pub badge: Badge,
    pub average_time: u64,
    pub best_streak: u32,
    pub date: String,
}

impl LeaderboardRow {
    /// "4/5 (80%)"
    pub fn headline(&self) -> String {
        format!("{}/{} ({}%)", self.score, self.total, self.accuracy)
    }
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry]) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| LeaderboardRow {
            rank: i + 1,
            score: entry.score,
            total: entry.total,
            accuracy: entry.accuracy,
            badge: entry.badge,
            average_time: entry.average_time,
            best_streak: entry.best_streak,
            date: entry.date.clone(),
        })
        .collect()
}

/// Seconds as `m:ss`.
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
