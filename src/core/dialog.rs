use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::DialogError,
    models::{Answers, Keywords, Questions},
    providers::SharedLanguageModel,
};

/// Returned when no questions could be generated.
pub const FALLBACK_QUESTIONS: [&str; 3] = [
    "What specific features are you looking for?",
    "Do you have a preferred brand?",
    "What is your budget for this purchase?",
];

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$")
        .expect("invalid code fence regex")
});

fn questions_prompt(intent: &str) -> String {
    let intent = match intent.trim() {
        "" => "something",
        intent => intent,
    };

    format!(
        r#"You are an intelligent shopping assistant.
The user is looking for: "{intent}".

Generate 3-4 qualifying questions to help narrow down their search.
One of the questions MUST be about their price range or budget.

Return the output as a JSON array of strings.
Example: ["Question 1?", "Question 2?", "What is your budget?"]
Do not wrap the output in markdown. Return only the raw JSON."#
    )
}

fn keywords_prompt(answers: &Answers) -> String {
    format!(
        r#"You are an intelligent shopping assistant.
Based on the following user preferences, generate exactly 5 distinct search keywords or short phrases for a product search engine.

User Preferences:
{}

Return the output as a JSON array of strings.
Example: ["keyword 1", "keyword 2", "keyword 3", "keyword 4", "keyword 5"]
Do not wrap the output in markdown. Return only the raw JSON."#,
        answers.to_json()
    )
}

/// Parses the model reply into a list of non-blank strings.
pub(crate) fn parse_string_array(text: &str) -> Result<Vec<String>, DialogError> {
    let text = text.trim();
    let text = match CODE_FENCE.captures(text) {
        Some(captures) => captures.get(1).map_or("", |m| m.as_str()),
        None => text,
    };

    if text.is_empty() {
        return Err(DialogError::EmptyGeneration);
    }

    let items: Vec<String> = serde_json::from_str(text)?;
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn dedup_case_insensitive(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

/// Turns shopping intents into questions, and answers into search keywords.
#[derive(Clone)]
pub struct DialogGenerator {
    model: SharedLanguageModel,
}

impl DialogGenerator {
    pub fn new(model: SharedLanguageModel) -> Self {
        Self { model }
    }

    pub async fn try_generate_questions(&self, intent: &str) -> Result<Questions, DialogError> {
        let text = self.model.generate_json(&questions_prompt(intent)).await?;
        let questions = parse_string_array(&text)?;
        if questions.is_empty() {
            return Err(DialogError::EmptyGeneration);
        }
        Ok(questions)
    }

    /// Clarifying questions for `intent`. Falls back to [`FALLBACK_QUESTIONS`]
    /// on any failure.
    pub async fn generate_questions(&self, intent: &str) -> Questions {
        match self.try_generate_questions(intent).await {
            Ok(questions) => questions,
            Err(e) => {
                log::error!(
                    "Error generating questions with {}: {}",
                    self.model.name(),
                    e
                );
                FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
            }
        }
    }

    pub async fn try_generate_keywords(&self, answers: &Answers) -> Result<Keywords, DialogError> {
        let text = self.model.generate_json(&keywords_prompt(answers)).await?;
        Ok(dedup_case_insensitive(parse_string_array(&text)?))
    }

    /// Search keywords for `answers`. Empty when generation failed.
    pub async fn generate_keywords(&self, answers: &Answers) -> Keywords {
        match self.try_generate_keywords(answers).await {
            Ok(keywords) => keywords,
            Err(e) => {
                log::error!(
                    "Error generating keywords with {}: {}",
                    self.model.name(),
                    e
                );
                Vec::new()
            }
        }
    }
}
