use futures::future::join_all;

use crate::{
    config::{Config, InterviewConfig, SearchConfig},
    core::dialog::DialogGenerator,
    engines::SharedSearchEngine,
    error::{InterviewError, SearchError},
    models::{Answers, Keywords, ProductRecord, Questions, SearchOutcome, SearchPage},
};

#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStage {
    Start,
    AwaitingAnswers,
    Searching,
    Done,
    Failed,
}

fn enter(stage: InterviewStage) {
    log::debug!("Interview stage: {}", stage);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub max_results: usize,
    pub region: String,
    pub max_keywords: usize,
}

impl SearchSettings {
    pub fn from_config(search: &SearchConfig, interview: &InterviewConfig) -> Self {
        Self {
            max_results: search.max_results,
            region: search.region.clone(),
            max_keywords: interview.max_keywords,
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self::from_config(&config.search, &config.interview)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default(), &InterviewConfig::default())
    }
}

/// Runs the two interview turns and the keyword fan-out.
#[derive(Clone)]
pub struct Interviewer {
    dialog: DialogGenerator,
    engine: SharedSearchEngine,
    settings: SearchSettings,
}

impl Interviewer {
    pub fn new(
        dialog: DialogGenerator,
        engine: SharedSearchEngine,
        settings: SearchSettings,
    ) -> Self {
        Self {
            dialog,
            engine,
            settings,
        }
    }

    /// First turn: clarifying questions for the shopper's intent.
    pub async fn start(&self, intent: Option<&str>) -> Result<Questions, InterviewError> {
        enter(InterviewStage::Start);
        let intent = intent
            .map(str::trim)
            .filter(|intent| !intent.is_empty())
            .ok_or(InterviewError::MissingInput("initialQuery"))?;

        log::info!("Starting interview for \"{}\"", intent);
        let questions = self.dialog.generate_questions(intent).await;

        enter(InterviewStage::AwaitingAnswers);
        Ok(questions)
    }

    /// Second turn: derive keywords from `answers` and search each of them.
    ///
    /// Fails only when `answers` is missing or no keyword could be derived.
    /// Failed searches are reported on their own `SearchOutcome`.
    pub async fn process(
        &self,
        answers: Option<&Answers>,
    ) -> Result<Vec<SearchOutcome>, InterviewError> {
        let answers = answers.ok_or(InterviewError::MissingInput("answers"))?;
        if answers.is_empty() {
            log::warn!("Deriving keywords from an empty set of answers");
        } else {
            log::info!("Deriving keywords from {} answers", answers.len());
        }

        let keywords = self.dialog.generate_keywords(answers).await;
        log::info!("Generated keywords: {:?}", keywords);

        if keywords.is_empty() {
            enter(InterviewStage::Failed);
            return Err(InterviewError::NoKeywords);
        }

        let results = self.search_all(keywords).await;
        enter(InterviewStage::Done);
        Ok(results)
    }

    /// Searches up to `max_keywords` keywords concurrently. The result has
    /// one entry per searched keyword, in keyword order.
    pub async fn search_all(&self, keywords: Keywords) -> Vec<SearchOutcome> {
        enter(InterviewStage::Searching);
        if keywords.len() > self.settings.max_keywords {
            log::debug!(
                "Dropping {} keywords over the limit of {}",
                keywords.len() - self.settings.max_keywords,
                self.settings.max_keywords
            );
        }

        let searches = keywords
            .into_iter()
            .take(self.settings.max_keywords)
            .map(|keyword| self.search_keyword(keyword));

        let results = join_all(searches).await;

        log::info!(
            "Searched {} keywords, {} failed",
            results.len(),
            results.iter().filter(|r| r.is_error()).count()
        );
        results
    }

    async fn search_keyword(&self, keyword: String) -> SearchOutcome {
        match self.search(&keyword).await {
            Ok(page) => SearchOutcome::found(keyword, page.products),
            Err(e) => {
                log::error!("Search failed for keyword \"{}\": {}", keyword, e);
                SearchOutcome::failed(keyword, e)
            }
        }
    }

    /// A single search with the configured result cap and region.
    pub async fn search(&self, query: &str) -> Result<SearchPage, SearchError> {
        self.engine
            .search_products(query, self.settings.max_results, &self.settings.region)
            .await
    }

    pub async fn product_details(&self, id: &str) -> Option<ProductRecord> {
        self.engine.product_details(id, &self.settings.region).await
    }
}
