use std::fmt;

use serde::{Deserialize, Serialize};

// === Difficulty ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "easy" -> "Easy"
        let s = self.as_str();
        write!(f, "{}{}", s[..1].to_ascii_uppercase(), &s[1..])
    }
}

// === Quiz Config ===

pub const MAX_QUESTIONS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub amount: u32,
    pub time_limit: u32,
}

impl QuizConfig {
    pub fn new(amount: u32, time_limit: u32) -> Self {
        Self {
            category: None,
            difficulty: None,
            amount,
            time_limit,
        }
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.amount == 0 || self.amount > MAX_QUESTIONS {
            return Err(format!(
                "Question count must be between 1 and {MAX_QUESTIONS}, got {}",
                self.amount
            ));
        }
        if self.time_limit == 0 {
            return Err("Time limit must be at least one second".to_string());
        }
        Ok(())
    }
}

// === Question ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub category: String,
    pub difficulty: Difficulty,
    /// Every option, correct one included, in display order.
    pub all_answers: Vec<String>,
}

impl Question {
    /// Build a question with its options shuffled into display order.
    pub fn shuffled<R: rand::Rng + ?Sized>(
        text: String,
        correct_answer: String,
        incorrect_answers: Vec<String>,
        category: String,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Self {
        use rand::seq::SliceRandom;

        let mut all_answers = Vec::with_capacity(incorrect_answers.len() + 1);
        all_answers.push(correct_answer.clone());
        all_answers.extend(incorrect_answers.iter().cloned());
        all_answers.shuffle(rng);

        Self {
            text,
            correct_answer,
            incorrect_answers,
            category,
            difficulty,
            all_answers,
        }
    }

    pub fn is_correct(&self, selected: Option<&str>) -> bool {
        selected == Some(self.correct_answer.as_str())
    }
}

// === Answered Record ===
// One per question, appended in answer order. A timeout or skip has no selection.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredRecord {
    pub question: String,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub all_answers: Vec<String>,
    pub is_correct: bool,
    pub time_spent: u64,
    pub category: String,
    pub difficulty: Difficulty,
}

// === Badge ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    Perfect,
    Excellent,
    Good,
    Fair,
    #[serde(rename = "Keep Learning")]
    KeepLearning,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Perfect => "Perfect",
            Badge::Excellent => "Excellent",
            Badge::Good => "Good",
            Badge::Fair => "Fair",
            Badge::KeepLearning => "Keep Learning",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Badge::Perfect => "🏆",
            Badge::Excellent => "🥇",
            Badge::Good => "🥈",
            Badge::Fair => "🥉",
            Badge::KeepLearning => "📚",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.label())
    }
}

// === Results ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakArea {
    pub category: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub score: u32,
    pub total: u32,
    pub accuracy: u32,
    pub total_time: u64,
    pub average_time: u64,
    pub best_streak: u32,
    pub badge: Badge,
    pub weak_areas: Vec<WeakArea>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub score: u32,
    pub total: u32,
    pub accuracy: u32,
    pub total_time: u64,
    pub average_time: u64,
    pub best_streak: u32,
    pub badge: Badge,
    pub date: String,
}

impl LeaderboardEntry {
    pub fn from_summary(summary: &QuizSummary, date: String) -> Self {
        Self {
            score: summary.score,
            total: summary.total,
            accuracy: summary.accuracy,
            total_time: summary.total_time,
            average_time: summary.average_time,
            best_streak: summary.best_streak,
            badge: summary.badge,
            date,
        }
    }
}

// === Theme ===

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// === Category ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u32,
    pub name: String,
}
