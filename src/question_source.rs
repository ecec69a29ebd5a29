use std::future::Future;
use std::time::Duration;

use log::{info, warn};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use url::Url;

use crate::error::{ApiResponseCode, FetchError};
use crate::model::types::{Category, Difficulty, Question, QuizConfig};

pub const DEFAULT_API_URL: &str = "https://opentdb.com";

/// Where questions come from. Implementations return exactly
/// `config.amount` questions or an error.
pub trait QuestionSource: Send + Sync {
    fn fetch_questions(
        &self,
        config: &QuizConfig,
    ) -> impl Future<Output = Result<Vec<Question>, FetchError>> + Send;

    fn fetch_categories(&self) -> impl Future<Output = Result<Vec<Category>, FetchError>> + Send;
}

// === Open Trivia DB wire format ===

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    category: String,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    trivia_categories: Vec<Category>,
}

fn decode(value: &str) -> Result<String, FetchError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| FetchError::Malformed(format!("bad encoding in {value:?}: {e}")))
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, FetchError> {
        let difficulty_text = decode(&self.difficulty)?;
        let difficulty = Difficulty::parse(&difficulty_text)
            .ok_or_else(|| FetchError::Malformed(format!("unknown difficulty {difficulty_text:?}")))?;
        if self.incorrect_answers.is_empty() {
            return Err(FetchError::Malformed(
                "question without incorrect answers".to_string(),
            ));
        }
        let incorrect_answers = self
            .incorrect_answers
            .iter()
            .map(|a| decode(a))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Question::shuffled(
            decode(&self.question)?,
            decode(&self.correct_answer)?,
            incorrect_answers,
            decode(&self.category)?,
            difficulty,
            &mut rand::rng(),
        ))
    }
}

/// Client for <https://opentdb.com>.
pub struct OpenTdbClient {
    http: reqwest::Client,
    base_url: Url,
    retries: usize,
    retry_base: Duration,
}

impl OpenTdbClient {
    pub fn new(base_url: &str, retries: usize) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // So that join() appends instead of replacing the last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url,
            retries,
            retry_base: Duration::from_secs(1),
        })
    }

    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    pub fn questions_url(&self, config: &QuizConfig) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("api.php")
            .map_err(|e| FetchError::Malformed(format!("bad API url: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("amount", &config.amount.to_string())
                .append_pair("type", "multiple")
                .append_pair("encode", "url3986");
            if let Some(category) = config.category {
                query.append_pair("category", &category.to_string());
            }
            if let Some(difficulty) = config.difficulty {
                query.append_pair("difficulty", difficulty.as_str());
            }
        }
        Ok(url)
    }

    fn categories_url(&self) -> Result<Url, FetchError> {
        self.base_url
            .join("api_category.php")
            .map_err(|e| FetchError::Malformed(format!("bad API url: {e}")))
    }

    async fn request_questions(&self, url: &Url) -> Result<Vec<Question>, FetchError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: QuestionsResponse = response.json().await?;

        if let Some(code) = ApiResponseCode::from_code(body.response_code) {
            warn!("Question API responded with code {}", body.response_code);
            return Err(FetchError::Api(code));
        }
        if body.results.is_empty() {
            return Err(FetchError::Empty);
        }
        body.results
            .into_iter()
            .map(RawQuestion::into_question)
            .collect()
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> + Send + use<> {
        // retry_base, then doubling, each with jitter
        let base_ms = self.retry_base.as_millis() as u64;
        ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2)
            .map(jitter)
            .take(self.retries)
    }
}

impl QuestionSource for OpenTdbClient {
    async fn fetch_questions(&self, config: &QuizConfig) -> Result<Vec<Question>, FetchError> {
        let url = self.questions_url(config)?;
        info!("Fetching questions from {url}");
        let questions = RetryIf::spawn(
            self.backoff(),
            || self.request_questions(&url),
            |e: &FetchError| {
                let transient = e.is_transient();
                if transient {
                    warn!("Retrying question fetch after: {e}");
                }
                transient
            },
        )
        .await?;
        info!("Fetched {} questions", questions.len());
        Ok(questions)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, FetchError> {
        let url = self.categories_url()?;
        info!("Fetching categories from {url}");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: CategoriesResponse = response.json().await?;
        Ok(body.trivia_categories)
    }
}

/// Serves a fixed list of questions, or a fixed API failure.
#[cfg(feature = "test-support")]
pub struct StaticQuestionSource {
    questions: Vec<Question>,
    failure: Option<ApiResponseCode>,
    categories: Vec<Category>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(feature = "test-support")]
impl StaticQuestionSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            failure: None,
            categories: Vec::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(code: ApiResponseCode) -> Self {
        Self {
            failure: Some(code),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "test-support")]
impl QuestionSource for StaticQuestionSource {
    async fn fetch_questions(&self, config: &QuizConfig) -> Result<Vec<Question>, FetchError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(code) = self.failure {
            return Err(FetchError::Api(code));
        }
        Ok(self
            .questions
            .iter()
            .take(config.amount as usize)
            .cloned()
            .collect())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, FetchError> {
        Ok(self.categories.clone())
    }
}
