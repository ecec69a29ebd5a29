use std::time::Duration;

use log::*;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{DEFAULT_AMOUNT, DEFAULT_FEEDBACK_DELAY, DEFAULT_TIME_LIMIT};
use crate::error::QuizError;
use crate::leaderboard;
use crate::model::action::PlayerAction;
use crate::model::event::{EventTx, QuizEvent, send_event};
use crate::model::quiz::{Phase, Quiz};
use crate::model::types::{LeaderboardEntry, QuizConfig, Theme};
use crate::persistence::PersistenceClient;
use crate::question_source::QuestionSource;
use crate::timer::{QuestionTimer, SignalRx, TimerSignal, TimerUpdate};
use crate::view::{QuestionView, TimerLevel, leaderboard_rows, review_items};

pub type ActionTx = mpsc::UnboundedSender<PlayerAction>;
pub type ActionRx = mpsc::UnboundedReceiver<PlayerAction>;

/// Owns the quiz, its timer and the stores, and is the only thing that
/// changes them. Player actions and timer signals are applied one at a time.
pub struct App<S> {
    quiz: Quiz,
    timer: QuestionTimer,
    signal_rx: Option<SignalRx>,
    source: S,
    persistence: PersistenceClient,
    events: EventTx,
    theme: Theme,
    defaults: QuizConfig,
    feedback_delay: Duration,
    /// The last answer is in but the result is not on the leaderboard yet.
    result_pending: bool,
}

impl<S: QuestionSource> App<S> {
    pub fn new(source: S, persistence: PersistenceClient, events: EventTx) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let theme = persistence.load_theme();
        Self {
            quiz: Quiz::new(),
            timer: QuestionTimer::new(signal_tx),
            signal_rx: Some(signal_rx),
            source,
            persistence,
            events,
            theme,
            defaults: QuizConfig::new(DEFAULT_AMOUNT, DEFAULT_TIME_LIMIT),
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            result_pending: false,
        }
    }

    pub fn with_feedback_delay(mut self, feedback_delay: Duration) -> Self {
        self.feedback_delay = feedback_delay;
        self
    }

    pub fn with_defaults(mut self, defaults: QuizConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn emit(&self, event: QuizEvent) {
        send_event(&self.events, event);
    }

    fn reject(&self, err: QuizError) {
        warn!("Rejected action: {err}");
        self.emit(QuizEvent::rejected(err.to_string()));
    }

    /// Apply one player action. Returns false once the player asked to exit.
    pub async fn handle_action(&mut self, action: PlayerAction) -> bool {
        info!("Handling action: {action:?}");
        match action {
            PlayerAction::StartQuiz { config } => self.start_quiz(config).await,

            PlayerAction::SelectOption { index } => match self.quiz.option_at(index) {
                Ok(answer) => self.answer(Some(answer)),
                Err(e) => self.reject(e),
            },
            PlayerAction::SubmitAnswer { answer } => self.answer(answer),
            PlayerAction::Skip => self.answer(None),

            PlayerAction::Pause => match self.quiz.pause() {
                Ok(()) => {
                    self.timer.pause();
                    self.emit(QuizEvent::Paused);
                }
                Err(e) => self.reject(e),
            },
            PlayerAction::Resume => match self.quiz.resume() {
                Ok(()) => {
                    self.emit(QuizEvent::Resumed);
                    let question_open = self
                        .quiz
                        .session()
                        .is_some_and(|session| session.is_question_open());
                    if question_open {
                        self.timer.resume();
                    } else {
                        // Paused during feedback; the delay was dropped with the pause
                        self.present_question();
                    }
                }
                Err(e) => self.reject(e),
            },

            PlayerAction::UseLifeline => {
                let result = self.quiz.use_lifeline(&mut rand::rng());
                match result {
                    Ok(eliminated) => {
                        let lifelines_remaining = self
                            .quiz
                            .session()
                            .map_or(0, |session| session.lifelines_remaining());
                        self.emit(QuizEvent::LifelineUsed {
                            eliminated,
                            lifelines_remaining,
                        });
                    }
                    Err(e) => self.reject(e),
                }
            }

            PlayerAction::Quit => {
                self.finish_quiz();
                self.timer.cancel();
                self.quiz.quit();
                self.emit(QuizEvent::ReturnedToSetup);
            }

            PlayerAction::NewQuiz => {
                if self.quiz.phase().is_in_progress() {
                    self.reject(QuizError::InvalidTransition {
                        action: "set up a new quiz",
                        phase: self.quiz.phase().name(),
                    });
                } else {
                    self.finish_quiz();
                    self.timer.cancel();
                    self.quiz.quit();
                    self.emit(QuizEvent::ReturnedToSetup);
                }
            }

            PlayerAction::ShowReview => match self.quiz.session() {
                Some(session) if self.quiz.phase() == Phase::Finished => {
                    let items = review_items(session.answers());
                    self.emit(QuizEvent::Review { items });
                }
                _ => self.reject(QuizError::InvalidTransition {
                    action: "review answers",
                    phase: self.quiz.phase().name(),
                }),
            },

            PlayerAction::ShowLeaderboard => {
                let rows = leaderboard_rows(&self.persistence.load_leaderboard());
                self.emit(QuizEvent::LeaderboardUpdated { rows });
            }

            PlayerAction::ClearLeaderboard => {
                if let Err(e) = self.persistence.clear_leaderboard() {
                    error!("Failed to clear leaderboard: {e:#}");
                }
                let rows = leaderboard_rows(&self.persistence.load_leaderboard());
                self.emit(QuizEvent::LeaderboardUpdated { rows });
            }

            PlayerAction::ToggleTheme => {
                self.theme = self.theme.toggled();
                if let Err(e) = self.persistence.save_theme(self.theme) {
                    error!("Failed to save theme: {e:#}");
                }
                self.emit(QuizEvent::ThemeChanged { theme: self.theme });
            }

            PlayerAction::ListCategories => match self.source.fetch_categories().await {
                Ok(categories) => self.emit(QuizEvent::Categories { categories }),
                Err(e) => {
                    warn!("Failed to fetch categories: {e}");
                    self.emit(QuizEvent::FetchFailed {
                        message: e.to_string(),
                    });
                }
            },

            PlayerAction::Exit => {
                self.finish_quiz();
                self.timer.cancel();
                info!("Exiting");
                return false;
            }
        }
        true
    }

    /// Apply a timer signal. Stale signals are dropped.
    pub fn handle_signal(&mut self, signal: TimerSignal) {
        match signal {
            TimerSignal::Tick { generation } => match self.timer.on_tick(generation) {
                Some(TimerUpdate::Tick { seconds_remaining }) => {
                    self.emit(QuizEvent::TimerTick {
                        seconds_remaining,
                        level: TimerLevel::for_seconds(seconds_remaining),
                    });
                }
                Some(TimerUpdate::TimeUp) => {
                    self.emit(QuizEvent::TimeUp);
                    self.answer(None);
                }
                None => {}
            },
            TimerSignal::FeedbackElapsed { generation } => {
                if !self.timer.on_feedback_elapsed(generation) {
                    return;
                }
                match self.quiz.phase() {
                    Phase::Finished => self.finish_quiz(),
                    Phase::Active => self.present_question(),
                    phase => debug!("Feedback elapsed while {}", phase.name()),
                }
            }
        }
    }

    async fn start_quiz(&mut self, config: QuizConfig) {
        self.finish_quiz();
        self.timer.cancel();
        self.emit(QuizEvent::Loading {
            config: config.clone(),
        });
        match self.quiz.start(&config, &self.source).await {
            Ok(()) => self.present_question(),
            Err(QuizError::Fetch(e)) => {
                self.emit(QuizEvent::FetchFailed {
                    message: e.to_string(),
                });
                self.emit(QuizEvent::ReturnedToSetup);
            }
            Err(e) => self.reject(e),
        }
    }

    fn present_question(&mut self) {
        let time_limit = match self.quiz.begin_question(Instant::now()) {
            Ok(_) => self.quiz.session().map(|session| session.time_limit()),
            Err(e) => {
                self.reject(e);
                return;
            }
        };
        if let Some(question) = self.quiz.session().and_then(QuestionView::from_session) {
            self.emit(QuizEvent::QuestionChanged { question });
        }
        if let Some(time_limit) = time_limit {
            self.timer.start(time_limit);
        }
    }

    /// Score the open question: answer, skip and timeout all land here.
    fn answer(&mut self, selected: Option<String>) {
        if let Err(e) = self.quiz.ensure_answerable() {
            self.reject(e);
            return;
        }
        // Nothing may tick against the next question
        self.timer.cancel();

        match self
            .quiz
            .submit_answer(selected.as_deref(), Instant::now())
        {
            Ok(outcome) => {
                self.result_pending = outcome.finished;
                self.emit(QuizEvent::AnswerScored {
                    is_correct: outcome.is_correct,
                    selected_answer: outcome.selected_answer,
                    correct_answer: outcome.correct_answer,
                    time_spent: outcome.time_spent,
                    score: outcome.score,
                    streak: outcome.streak,
                });
                self.timer.schedule_feedback(self.feedback_delay);
            }
            Err(e) => self.reject(e),
        }
    }

    /// Record and announce the result of a finished quiz, at most once. Runs
    /// when the last feedback delay elapses, or earlier if the player leaves
    /// the results before that.
    fn finish_quiz(&mut self) {
        if !self.result_pending {
            return;
        }
        self.result_pending = false;
        let Some(summary) = self.quiz.finish(Instant::now()) else {
            error!("Quiz finished without a summary");
            return;
        };
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let entry = LeaderboardEntry::from_summary(&summary, date);

        let made_leaderboard =
            leaderboard::qualifies(&self.persistence.load_leaderboard(), &entry);
        let (entries, saved) = self.persistence.record_result(entry);
        if let Err(e) = saved {
            error!("Failed to save leaderboard: {e:#}");
        }

        self.emit(QuizEvent::QuizFinished {
            summary,
            made_leaderboard,
        });
        self.emit(QuizEvent::LeaderboardUpdated {
            rows: leaderboard_rows(&entries),
        });
    }

    /// Drive the quiz until the player exits or the action channel closes.
    pub async fn run(mut self, mut actions: ActionRx) {
        let Some(mut signals) = self.signal_rx.take() else {
            error!("Quiz loop already ran");
            return;
        };

        self.emit(QuizEvent::SetupReady {
            theme: self.theme,
            defaults: self.defaults.clone(),
        });

        loop {
            tokio::select! {
                action = actions.recv() => {
                    let Some(action) = action else {
                        info!("Action channel closed");
                        break;
                    };
                    if !self.handle_action(action).await {
                        break;
                    }
                }
                Some(signal) = signals.recv() => {
                    self.handle_signal(signal);
                }
            }
        }
        self.finish_quiz();
        self.timer.cancel();
    }
}
