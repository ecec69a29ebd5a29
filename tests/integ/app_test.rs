use std::time::Duration;

use crate::common::{TestQuiz, sample_questions};

use trivia_quiz::error::ApiResponseCode;
use trivia_quiz::model::action::PlayerAction;
use trivia_quiz::model::event::QuizEvent;
use trivia_quiz::model::types::{Badge, Category, QuizConfig, Theme};
use trivia_quiz::persistence::THEME_KEY;
use trivia_quiz::question_source::StaticQuestionSource;
use trivia_quiz::view::TimerLevel;

fn rejection(event: QuizEvent) -> String {
    match event {
        QuizEvent::Rejected { message } => message,
        other => panic!("Expected Rejected, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn timer_runs_out_and_scores_as_incorrect() {
    let source = StaticQuestionSource::new(sample_questions(1, "Geography"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(1, 3)).await;

    for expected in [2, 1] {
        match quiz.recv().await {
            QuizEvent::TimerTick {
                seconds_remaining,
                level,
            } => {
                assert_eq!(seconds_remaining, expected);
                assert_eq!(level, TimerLevel::Danger);
            }
            other => panic!("Expected TimerTick, got {other:?}"),
        }
    }
    assert_eq!(quiz.recv().await, QuizEvent::TimeUp);

    match quiz.recv().await {
        QuizEvent::AnswerScored {
            is_correct,
            selected_answer,
            correct_answer,
            time_spent,
            streak,
            ..
        } => {
            assert!(!is_correct);
            assert_eq!(selected_answer, None);
            assert_eq!(correct_answer, "Right 0");
            assert_eq!(time_spent, 3);
            assert_eq!(streak, 0);
        }
        other => panic!("Expected AnswerScored, got {other:?}"),
    }

    match quiz.recv().await {
        QuizEvent::QuizFinished { summary, .. } => {
            assert_eq!(summary.score, 0);
            assert_eq!(summary.badge, Badge::KeepLearning);
            assert_eq!(summary.weak_areas.len(), 1);
            assert_eq!(summary.weak_areas[0].category, "Geography");
            assert_eq!(summary.weak_areas[0].accuracy, 0.0);
        }
        other => panic!("Expected QuizFinished, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_the_countdown() {
    let source = StaticQuestionSource::new(sample_questions(2, "Music"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(2, 20)).await;

    match quiz.recv().await {
        QuizEvent::TimerTick {
            seconds_remaining, ..
        } => assert_eq!(seconds_remaining, 19),
        other => panic!("Expected TimerTick, got {other:?}"),
    }

    quiz.send(PlayerAction::Pause);
    assert_eq!(quiz.recv().await, QuizEvent::Paused);

    tokio::time::sleep(Duration::from_secs(30)).await;
    quiz.assert_quiet();

    quiz.send(PlayerAction::SubmitAnswer {
        answer: Some("Right 0".to_string()),
    });
    assert_eq!(rejection(quiz.recv().await), "Cannot answer while paused");

    quiz.send(PlayerAction::Resume);
    assert_eq!(quiz.recv().await, QuizEvent::Resumed);
    match quiz.recv().await {
        QuizEvent::TimerTick {
            seconds_remaining,
            level,
        } => {
            assert_eq!(seconds_remaining, 18);
            assert_eq!(level, TimerLevel::Normal);
        }
        other => panic!("Expected TimerTick, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn pause_during_feedback_holds_the_next_question() {
    let source = StaticQuestionSource::new(sample_questions(2, "Music"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(2, 20)).await;

    quiz.answer(Some("Right 0")).await;
    quiz.send(PlayerAction::Pause);
    assert_eq!(quiz.recv().await, QuizEvent::Paused);

    tokio::time::sleep(Duration::from_secs(10)).await;
    quiz.assert_quiet();

    quiz.send(PlayerAction::Resume);
    assert_eq!(quiz.recv().await, QuizEvent::Resumed);
    match quiz.recv().await {
        QuizEvent::QuestionChanged { question } => {
            assert_eq!(question.number, 2);
            assert_eq!(question.seconds_remaining, 20);
        }
        other => panic!("Expected QuestionChanged, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_returns_to_setup() {
    let mut quiz = TestQuiz::start(StaticQuestionSource::failing(ApiResponseCode::NoResults)).await;

    quiz.send(PlayerAction::StartQuiz {
        config: QuizConfig::new(10, 30).with_category(9),
    });
    match quiz.recv().await {
        QuizEvent::Loading { config } => assert_eq!(config.category, Some(9)),
        other => panic!("Expected Loading, got {other:?}"),
    }
    match quiz.recv().await {
        QuizEvent::FetchFailed { message } => {
            assert_eq!(message, "Not enough questions for that category and difficulty")
        }
        other => panic!("Expected FetchFailed, got {other:?}"),
    }
    assert_eq!(quiz.recv().await, QuizEvent::ReturnedToSetup);

    quiz.send(PlayerAction::Pause);
    assert_eq!(rejection(quiz.recv().await), "Cannot pause while in setup");
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let source = StaticQuestionSource::new(sample_questions(1, "Art"));
    let mut quiz = TestQuiz::start(source).await;

    quiz.send(PlayerAction::StartQuiz {
        config: QuizConfig::new(0, 30),
    });
    assert!(matches!(quiz.recv().await, QuizEvent::Loading { .. }));
    let message = rejection(quiz.recv().await);
    assert!(
        message.starts_with("Invalid quiz settings"),
        "Unexpected message: {message}"
    );
}

#[tokio::test(start_paused = true)]
async fn fifty_fifty_is_single_use() {
    let source = StaticQuestionSource::new(sample_questions(1, "Sports"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(1, 30)).await;

    quiz.send(PlayerAction::UseLifeline);
    match quiz.recv().await {
        QuizEvent::LifelineUsed {
            eliminated,
            lifelines_remaining,
        } => {
            assert_eq!(eliminated.len(), 2);
            assert!(!eliminated.contains(&"Right 0".to_string()));
            assert_eq!(lifelines_remaining, 0);
        }
        other => panic!("Expected LifelineUsed, got {other:?}"),
    }

    quiz.send(PlayerAction::UseLifeline);
    assert_eq!(rejection(quiz.recv().await), "No lifelines remaining");

    // Two options left; the correct answer comes first in the fixture order
    quiz.send(PlayerAction::SelectOption { index: 2 });
    assert_eq!(rejection(quiz.recv().await), "There is no option 3");

    quiz.send(PlayerAction::SelectOption { index: 0 });
    match quiz
        .recv_until(|e| matches!(e, QuizEvent::AnswerScored { .. }))
        .await
    {
        QuizEvent::AnswerScored {
            is_correct,
            selected_answer,
            ..
        } => {
            assert!(is_correct);
            assert_eq!(selected_answer.as_deref(), Some("Right 0"));
        }
        other => panic!("Expected AnswerScored, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn skip_counts_as_incorrect_and_moves_on() {
    let source = StaticQuestionSource::new(sample_questions(2, "Film"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(2, 30)).await;

    quiz.answer(Some("Right 0")).await;
    quiz.recv_until(|e| matches!(e, QuizEvent::QuestionChanged { .. }))
        .await;

    quiz.send(PlayerAction::Skip);
    match quiz.recv().await {
        QuizEvent::AnswerScored {
            is_correct,
            selected_answer,
            score,
            streak,
            ..
        } => {
            assert!(!is_correct);
            assert_eq!(selected_answer, None);
            assert_eq!(score, 1);
            assert_eq!(streak, 0);
        }
        other => panic!("Expected AnswerScored, got {other:?}"),
    }

    match quiz.recv().await {
        QuizEvent::QuizFinished { summary, .. } => {
            assert_eq!(summary.score, 1);
            assert_eq!(summary.accuracy, 50);
            assert_eq!(summary.best_streak, 1);
            assert_eq!(summary.badge, Badge::KeepLearning);
        }
        other => panic!("Expected QuizFinished, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn quit_abandons_the_session() {
    let source = StaticQuestionSource::new(sample_questions(3, "Film"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(3, 30)).await;

    quiz.send(PlayerAction::Quit);
    assert_eq!(
        quiz.recv_until(|e| !matches!(e, QuizEvent::TimerTick { .. }))
            .await,
        QuizEvent::ReturnedToSetup
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    quiz.assert_quiet();

    quiz.send(PlayerAction::ShowReview);
    assert_eq!(
        rejection(quiz.recv().await),
        "Cannot review answers while in setup"
    );
    assert!(quiz.persistence().load_leaderboard().is_empty());
}

#[tokio::test(start_paused = true)]
async fn review_is_only_available_after_finishing() {
    let source = StaticQuestionSource::new(sample_questions(2, "Books"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(2, 30)).await;

    quiz.send(PlayerAction::ShowReview);
    assert_eq!(
        rejection(quiz.recv().await),
        "Cannot review answers while a question is active"
    );

    quiz.answer(Some("Right 0")).await;
    quiz.recv_until(|e| matches!(e, QuizEvent::QuestionChanged { .. }))
        .await;
    quiz.answer(Some("Wrong 1a")).await;
    quiz.recv_until(|e| matches!(e, QuizEvent::LeaderboardUpdated { .. }))
        .await;

    quiz.send(PlayerAction::ShowReview);
    match quiz.recv().await {
        QuizEvent::Review { items } => {
            assert_eq!(items.len(), 2);
            assert!(items[0].is_correct);
            assert!(!items[1].is_correct);
            let picked: Vec<_> = items[1].options.iter().filter(|o| o.was_selected).collect();
            assert_eq!(picked.len(), 1);
            assert_eq!(picked[0].text, "Wrong 1a");
            assert!(!picked[0].is_correct);
        }
        other => panic!("Expected Review, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn leaderboard_can_be_shown_and_cleared() {
    let source = StaticQuestionSource::new(sample_questions(1, "Art"));
    let mut quiz = TestQuiz::start(source).await;

    quiz.send(PlayerAction::ShowLeaderboard);
    assert_eq!(
        quiz.recv().await,
        QuizEvent::LeaderboardUpdated { rows: Vec::new() }
    );

    quiz.begin(QuizConfig::new(1, 30)).await;
    quiz.answer(Some("Right 0")).await;
    quiz.recv_until(|e| matches!(e, QuizEvent::LeaderboardUpdated { .. }))
        .await;

    quiz.send(PlayerAction::ShowLeaderboard);
    match quiz.recv().await {
        QuizEvent::LeaderboardUpdated { rows } => assert_eq!(rows.len(), 1),
        other => panic!("Expected LeaderboardUpdated, got {other:?}"),
    }

    quiz.send(PlayerAction::ClearLeaderboard);
    assert_eq!(
        quiz.recv().await,
        QuizEvent::LeaderboardUpdated { rows: Vec::new() }
    );
    assert!(!quiz.data_path("quiz-leaderboard").exists());
}

#[tokio::test(start_paused = true)]
async fn theme_toggle_is_persisted() {
    let source = StaticQuestionSource::new(Vec::new());
    let mut quiz = TestQuiz::start(source).await;

    quiz.send(PlayerAction::ToggleTheme);
    assert_eq!(
        quiz.recv().await,
        QuizEvent::ThemeChanged { theme: Theme::Dark }
    );
    let stored = std::fs::read_to_string(quiz.data_path(THEME_KEY)).expect("Theme file missing");
    assert_eq!(stored, "dark");
    assert_eq!(quiz.persistence().load_theme(), Theme::Dark);

    quiz.send(PlayerAction::ToggleTheme);
    assert_eq!(
        quiz.recv().await,
        QuizEvent::ThemeChanged {
            theme: Theme::Light
        }
    );
    assert_eq!(quiz.persistence().load_theme(), Theme::Light);
}

#[tokio::test(start_paused = true)]
async fn saved_theme_is_announced_on_startup() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join(THEME_KEY), "dark").expect("Failed to write theme");

    let persistence = trivia_quiz::persistence::PersistenceClient::new(Box::new(
        trivia_quiz::persistence::FileStore::new(dir.path()),
    ));
    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let (actions_tx, actions_rx) = tokio::sync::mpsc::unbounded_channel();
    let app = trivia_quiz::app::App::new(
        StaticQuestionSource::new(Vec::new()),
        persistence,
        events_tx,
    );
    assert_eq!(app.theme(), Theme::Dark);

    let handle = tokio::spawn(app.run(actions_rx));
    match events_rx.recv().await {
        Some(QuizEvent::SetupReady { theme, defaults }) => {
            assert_eq!(theme, Theme::Dark);
            assert_eq!(defaults, QuizConfig::new(10, 30));
        }
        other => panic!("Expected SetupReady, got {other:?}"),
    }

    actions_tx
        .send(PlayerAction::Exit)
        .expect("Quiz loop stopped");
    handle.await.expect("Quiz loop panicked");
}

#[tokio::test(start_paused = true)]
async fn categories_are_listed() {
    let source = StaticQuestionSource::new(Vec::new()).with_categories(vec![
        Category {
            id: 9,
            name: "General Knowledge".to_string(),
        },
        Category {
            id: 17,
            name: "Science & Nature".to_string(),
        },
    ]);
    let mut quiz = TestQuiz::start(source).await;

    quiz.send(PlayerAction::ListCategories);
    match quiz.recv().await {
        QuizEvent::Categories { categories } => {
            assert_eq!(categories.len(), 2);
            assert_eq!(categories[1].id, 17);
        }
        other => panic!("Expected Categories, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn data_dir_starts_empty() {
    let quiz = TestQuiz::start(StaticQuestionSource::new(Vec::new())).await;
    let entries = std::fs::read_dir(quiz.data_dir())
        .expect("Data dir missing")
        .count();
    assert_eq!(entries, 0);
}

#[tokio::test(start_paused = true)]
async fn new_quiz_leaves_results_for_setup() {
    let source = StaticQuestionSource::new(sample_questions(2, "Books"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(1, 30)).await;

    quiz.send(PlayerAction::NewQuiz);
    assert_eq!(
        rejection(quiz.recv().await),
        "Cannot set up a new quiz while a question is active"
    );

    quiz.answer(Some("Right 0")).await;
    quiz.recv_until(|e| matches!(e, QuizEvent::LeaderboardUpdated { .. }))
        .await;

    quiz.send(PlayerAction::NewQuiz);
    assert_eq!(quiz.recv().await, QuizEvent::ReturnedToSetup);

    // The finished session is gone with it
    quiz.send(PlayerAction::ShowReview);
    assert_eq!(
        rejection(quiz.recv().await),
        "Cannot review answers while in setup"
    );
    assert_eq!(quiz.persistence().load_leaderboard().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn leaving_the_results_early_still_records_them() {
    let source = StaticQuestionSource::new(sample_questions(1, "Books"));
    let mut quiz = TestQuiz::start(source).await;
    quiz.begin(QuizConfig::new(1, 30)).await;
    quiz.answer(Some("Right 0")).await;

    // Straight back to setup before the last feedback pause is over
    quiz.send(PlayerAction::NewQuiz);
    match quiz.recv().await {
        QuizEvent::QuizFinished {
            summary,
            made_leaderboard,
        } => {
            assert_eq!(summary.score, 1);
            assert!(made_leaderboard);
        }
        other => panic!("Expected QuizFinished, got {other:?}"),
    }
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::LeaderboardUpdated { .. }
    ));
    assert_eq!(quiz.recv().await, QuizEvent::ReturnedToSetup);

    tokio::time::sleep(Duration::from_secs(10)).await;
    quiz.assert_quiet();
    assert_eq!(quiz.persistence().load_leaderboard().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn quitting_or_restarting_from_the_results_records_them_once() {
    let source = StaticQuestionSource::new(sample_questions(1, "Books"));
    let mut quiz = TestQuiz::start(source).await;

    quiz.begin(QuizConfig::new(1, 30)).await;
    quiz.answer(Some("Right 0")).await;
    quiz.send(PlayerAction::StartQuiz {
        config: QuizConfig::new(1, 30),
    });
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::QuizFinished { .. }
    ));
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::LeaderboardUpdated { .. }
    ));
    assert!(matches!(quiz.recv().await, QuizEvent::Loading { .. }));
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::QuestionChanged { .. }
    ));

    quiz.answer(Some("Wrong 0a")).await;
    quiz.send(PlayerAction::Quit);
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::QuizFinished { .. }
    ));
    assert!(matches!(
        quiz.recv().await,
        QuizEvent::LeaderboardUpdated { .. }
    ));
    assert_eq!(quiz.recv().await, QuizEvent::ReturnedToSetup);

    // A second quit has nothing left to record
    quiz.send(PlayerAction::Quit);
    assert_eq!(quiz.recv().await, QuizEvent::ReturnedToSetup);
    tokio::time::sleep(Duration::from_secs(10)).await;
    quiz.assert_quiet();
    assert_eq!(quiz.persistence().load_leaderboard().len(), 2);
}
