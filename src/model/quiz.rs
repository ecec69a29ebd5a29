use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use crate::error::{FetchError, QuizError};
use crate::model::types::{AnsweredRecord, Question, QuizConfig, QuizSummary};
use crate::question_source::QuestionSource;
use crate::scoring;

pub const MAX_LIFELINES: u32 = 1;

/// Options removed by the 50:50 lifeline.
const FIFTY_FIFTY_ELIMINATED: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Loading,
    Active,
    Paused,
    Finished,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Setup => "in setup",
            Phase::Loading => "loading questions",
            Phase::Active => "a question is active",
            Phase::Paused => "paused",
            Phase::Finished => "the quiz is finished",
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Phase::Active | Phase::Paused)
    }
}

/// Everything that happens to one run of the quiz. Only [`Quiz`] mutates it.
#[derive(Debug)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    streak: u32,
    best_streak: u32,
    lifelines_used: u32,
    time_limit: u32,
    start_time: Instant,
    question_start_time: Instant,
    question_open: bool,
    eliminated: Vec<String>,
    answers: Vec<AnsweredRecord>,
    finished_at: Option<Instant>,
}

impl QuizSession {
    fn new(questions: Vec<Question>, time_limit: u32, now: Instant) -> Self {
        Self {
            questions,
            current_index: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            lifelines_used: 0,
            time_limit,
            start_time: now,
            question_start_time: now,
            question_open: false,
            eliminated: Vec::new(),
            answers: Vec::new(),
            finished_at: None,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn lifelines_used(&self) -> u32 {
        self.lifelines_used
    }

    pub fn lifelines_remaining(&self) -> u32 {
        MAX_LIFELINES.saturating_sub(self.lifelines_used)
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn answers(&self) -> &[AnsweredRecord] {
        &self.answers
    }

    pub fn eliminated(&self) -> &[String] {
        &self.eliminated
    }

    pub fn is_question_open(&self) -> bool {
        self.question_open
    }

    /// Options of the current question still on the table after any 50:50.
    pub fn available_answers(&self) -> Vec<&str> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        question
            .all_answers
            .iter()
            .filter(|answer| !self.eliminated.contains(answer))
            .map(String::as_str)
            .collect()
    }
}

/// Result of scoring one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub time_spent: u64,
    pub score: u32,
    pub streak: u32,
    pub finished: bool,
}

/// The quiz state machine: `Setup -> Loading -> Active/Paused -> Finished`.
#[derive(Debug)]
pub struct Quiz {
    phase: Phase,
    session: Option<QuizSession>,
}

impl Default for Quiz {
    fn default() -> Self {
        Self::new()
    }
}

impl Quiz {
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    fn reject(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    /// Load questions and enter the first question. On any failure the quiz is
    /// back in setup with no session.
    pub async fn start<S: QuestionSource>(
        &mut self,
        config: &QuizConfig,
        source: &S,
    ) -> Result<(), QuizError> {
        if !matches!(self.phase, Phase::Setup | Phase::Finished) {
            return Err(self.reject("start a quiz"));
        }
        config.validate().map_err(QuizError::InvalidConfig)?;

        self.session = None;
        self.phase = Phase::Loading;
        info!(
            "Loading {} questions (category {:?}, difficulty {:?})",
            config.amount, config.category, config.difficulty
        );

        let questions = match source.fetch_questions(config).await {
            Ok(questions) if questions.is_empty() => Err(FetchError::Empty),
            Ok(questions) if questions.len() != config.amount as usize => {
                Err(FetchError::Malformed(format!(
                    "asked for {} questions, got {}",
                    config.amount,
                    questions.len()
                )))
            }
            other => other,
        };

        match questions {
            Ok(questions) => {
                info!("Quiz started with {} questions", questions.len());
                self.session = Some(QuizSession::new(
                    questions,
                    config.time_limit,
                    Instant::now(),
                ));
                self.phase = Phase::Active;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start quiz: {e}");
                self.phase = Phase::Setup;
                Err(QuizError::Fetch(e))
            }
        }
    }

    /// Open the current question for answering and restart its clock.
    pub fn begin_question(&mut self, now: Instant) -> Result<&Question, QuizError> {
        if self.phase != Phase::Active {
            return Err(self.reject("show a question"));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(QuizError::NoOpenQuestion);
        };
        if session.current_index >= session.questions.len() {
            return Err(QuizError::NoOpenQuestion);
        }
        session.question_open = true;
        session.question_start_time = now;
        Ok(&session.questions[session.current_index])
    }

    /// Check that an answer would be accepted right now, without changing anything.
    pub fn ensure_answerable(&self) -> Result<(), QuizError> {
        if self.phase != Phase::Active {
            return Err(self.reject("answer"));
        }
        match &self.session {
            Some(session) if session.question_open => Ok(()),
            _ => Err(QuizError::NoOpenQuestion),
        }
    }

    /// Score the open question and move on. `None` is a timeout or a skip and
    /// always counts as incorrect.
    pub fn submit_answer(
        &mut self,
        selected: Option<&str>,
        now: Instant,
    ) -> Result<AnswerOutcome, QuizError> {
        self.ensure_answerable()?;
        let Some(session) = self.session.as_mut() else {
            return Err(QuizError::NoOpenQuestion);
        };

        let question = &session.questions[session.current_index];
        let is_correct = question.is_correct(selected);
        let time_spent = now
            .saturating_duration_since(session.question_start_time)
            .as_secs_f64()
            .round() as u64;

        session.answers.push(AnsweredRecord {
            question: question.text.clone(),
            selected_answer: selected.map(str::to_string),
            correct_answer: question.correct_answer.clone(),
            all_answers: question.all_answers.clone(),
            is_correct,
            time_spent,
            category: question.category.clone(),
            difficulty: question.difficulty,
        });
        let correct_answer = question.correct_answer.clone();

        if is_correct {
            session.score += 1;
            session.streak += 1;
            session.best_streak = session.best_streak.max(session.streak);
        } else {
            session.streak = 0;
        }

        session.current_index += 1;
        session.eliminated.clear();
        session.question_open = false;
        session.question_start_time = now;

        let finished = session.current_index >= session.questions.len();
        if finished {
            session.finished_at = Some(now);
            self.phase = Phase::Finished;
            info!(
                "Quiz finished: {}/{}",
                session.score,
                session.questions.len()
            );
        }

        Ok(AnswerOutcome {
            is_correct,
            selected_answer: selected.map(str::to_string),
            correct_answer,
            time_spent,
            score: session.score,
            streak: session.streak,
            finished,
        })
    }

    pub fn skip(&mut self, now: Instant) -> Result<AnswerOutcome, QuizError> {
        self.submit_answer(None, now)
    }

    /// Resolve a zero-based index into the options still available.
    pub fn option_at(&self, index: usize) -> Result<String, QuizError> {
        self.ensure_answerable()?;
        self.session
            .as_ref()
            .and_then(|session| session.available_answers().get(index).map(|s| s.to_string()))
            .ok_or(QuizError::OptionOutOfRange(index + 1))
    }

    pub fn pause(&mut self) -> Result<(), QuizError> {
        if self.phase != Phase::Active {
            return Err(self.reject("pause"));
        }
        self.phase = Phase::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), QuizError> {
        if self.phase != Phase::Paused {
            return Err(self.reject("resume"));
        }
        self.phase = Phase::Active;
        Ok(())
    }

    /// Back to setup from anywhere; the session is dropped.
    pub fn quit(&mut self) {
        if self.session.take().is_some() {
            info!("Quiz abandoned");
        }
        self.phase = Phase::Setup;
    }

    /// 50:50: drop two random incorrect options from the open question.
    pub fn use_lifeline<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<String>, QuizError> {
        self.ensure_answerable()?;
        let Some(session) = self.session.as_mut() else {
            return Err(QuizError::NoOpenQuestion);
        };
        if session.lifelines_used >= MAX_LIFELINES {
            return Err(QuizError::LifelineExhausted);
        }

        let question = &session.questions[session.current_index];
        let mut incorrect: Vec<String> = question
            .all_answers
            .iter()
            .filter(|answer| **answer != question.correct_answer)
            .cloned()
            .collect();
        incorrect.shuffle(rng);
        incorrect.truncate(FIFTY_FIFTY_ELIMINATED);

        session.lifelines_used += 1;
        session.eliminated = incorrect.clone();
        info!("50:50 used, eliminated {incorrect:?}");
        Ok(incorrect)
    }

    /// Stop the quiz clock once the results are shown. The last feedback
    /// delay counts toward the total time.
    pub fn finish(&mut self, now: Instant) -> Option<QuizSummary> {
        if self.phase != Phase::Finished {
            return None;
        }
        let session = self.session.as_mut()?;
        session.finished_at = Some(session.finished_at.map_or(now, |at| at.max(now)));
        self.summary()
    }

    /// Final results; `None` until the last question has been answered.
    pub fn summary(&self) -> Option<QuizSummary> {
        if self.phase != Phase::Finished {
            return None;
        }
        let session = self.session.as_ref()?;
        let finished_at = session.finished_at?;
        let total_time = finished_at
            .saturating_duration_since(session.start_time)
            .as_secs_f64()
            .round() as u64;
        Some(scoring::summarize(
            session.score,
            session.questions.len() as u32,
            session.best_streak,
            total_time,
            &session.answers,
        ))
    }
}
