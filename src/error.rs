use std::fmt;

/// Why a batch of questions could not be loaded. Always recoverable: the quiz
/// goes back to setup and nothing of the attempted session is kept.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure talking to the question API.
    Network(reqwest::Error),
    /// The API answered with a non-success HTTP status.
    Status(u16),
    /// The API answered with a non-zero `response_code`.
    Api(ApiResponseCode),
    /// The payload parsed but did not hold what was asked for.
    Malformed(String),
    /// Zero questions came back.
    Empty,
}

/// Open Trivia DB `response_code` values other than success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiResponseCode {
    NoResults,
    InvalidParameter,
    TokenNotFound,
    TokenEmpty,
    RateLimited,
    Unknown(u8),
}

impl ApiResponseCode {
    /// `None` for code 0 (success).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(ApiResponseCode::NoResults),
            2 => Some(ApiResponseCode::InvalidParameter),
            3 => Some(ApiResponseCode::TokenNotFound),
            4 => Some(ApiResponseCode::TokenEmpty),
            5 => Some(ApiResponseCode::RateLimited),
            other => Some(ApiResponseCode::Unknown(other)),
        }
    }
}

impl FetchError {
    /// Worth another attempt after a pause.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status(status) => *status == 429 || *status >= 500,
            FetchError::Api(code) => *code == ApiResponseCode::RateLimited,
            FetchError::Malformed(_) | FetchError::Empty => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(e) => write!(f, "Network error: {e}"),
            FetchError::Status(status) => write!(f, "Question API returned HTTP {status}"),
            FetchError::Api(code) => match code {
                ApiResponseCode::NoResults => {
                    write!(f, "Not enough questions for that category and difficulty")
                }
                ApiResponseCode::InvalidParameter => write!(f, "Invalid quiz settings"),
                ApiResponseCode::TokenNotFound | ApiResponseCode::TokenEmpty => {
                    write!(f, "Question session token rejected")
                }
                ApiResponseCode::RateLimited => write!(f, "Too many requests, try again shortly"),
                ApiResponseCode::Unknown(code) => write!(f, "Question API error code {code}"),
            },
            FetchError::Malformed(reason) => write!(f, "Unexpected question data: {reason}"),
            FetchError::Empty => write!(f, "No questions returned"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err)
    }
}

/// Rejections from the quiz state machine. None of these are fatal; the
/// driver logs them and carries on with the state unchanged.
#[derive(Debug)]
pub enum QuizError {
    InvalidConfig(String),
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    NoOpenQuestion,
    LifelineExhausted,
    OptionOutOfRange(usize),
    Fetch(FetchError),
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizError::InvalidConfig(reason) => write!(f, "Invalid quiz settings: {reason}"),
            QuizError::InvalidTransition { action, phase } => {
                write!(f, "Cannot {action} while {phase}")
            }
            QuizError::NoOpenQuestion => write!(f, "No question is waiting for an answer"),
            QuizError::LifelineExhausted => write!(f, "No lifelines remaining"),
            QuizError::OptionOutOfRange(index) => write!(f, "There is no option {index}"),
            QuizError::Fetch(e) => write!(f, "Failed to load questions: {e}"),
        }
    }
}

impl std::error::Error for QuizError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuizError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for QuizError {
    fn from(err: FetchError) -> Self {
        QuizError::Fetch(err)
    }
}
