use serde::{Deserialize, Serialize};

use crate::model::types::QuizConfig;

/// What the player can ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PlayerAction {
    #[serde(rename_all = "camelCase")]
    StartQuiz { config: QuizConfig },

    /// Zero-based index into the options still available.
    #[serde(rename_all = "camelCase")]
    SelectOption { index: usize },

    #[serde(rename_all = "camelCase")]
    SubmitAnswer { answer: Option<String> },

    Pause,
    Resume,
    Skip,
    UseLifeline,
    Quit,
    /// Leave the results screen for setup.
    NewQuiz,

    ShowReview,
    ShowLeaderboard,
    ClearLeaderboard,
    ToggleTheme,
    ListCategories,

    Exit,
}
