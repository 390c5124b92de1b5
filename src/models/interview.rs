use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value};

use crate::models::ProductRecord;

/// Clarifying questions, in the order they should be asked.
pub type Questions = Vec<String>;

/// Search phrases derived from the answers.
pub type Keywords = Vec<String>;

/// Key used when the caller sends free text instead of question/answer pairs
const CONTEXT_KEY: &str = "context";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

/// The shopper's answers, keyed by question text.
///
/// Questions keep the position of their first occurrence, a repeated question
/// replaces the earlier answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers(Vec<Answer>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();

        match self.0.iter_mut().find(|a| a.question == question) {
            Some(existing) => existing.answer = answer,
            None => self.0.push(Answer { question, answer }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object form used when prompting the language model
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|a| (a.question.clone(), Value::String(a.answer.clone())))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl<Q: Into<String>, A: Into<String>> FromIterator<(Q, A)> for Answers {
    fn from_iter<T: IntoIterator<Item = (Q, A)>>(iter: T) -> Self {
        let mut answers = Answers::new();
        for (question, answer) in iter {
            answers.insert(question, answer);
        }
        answers
    }
}

fn answer_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl TryFrom<Value> for Answers {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(question, answer)| (question, answer_text(answer)))
                .collect()),
            Value::Array(items) => {
                let mut answers = Answers::new();
                for item in items {
                    let pair: Answer = serde_json::from_value(item).map_err(|e| {
                        format!("answers array entries need question and answer: {e}")
                    })?;
                    answers.insert(pair.question, pair.answer);
                }
                Ok(answers)
            }
            Value::String(context) => Ok([(CONTEXT_KEY, context)].into_iter().collect()),
            other => Err(format!("unsupported answers format: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Answers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Answers::try_from(value).map_err(D::Error::custom)
    }
}

impl Serialize for Answers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Result of searching a single keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub keyword: String,
    pub items: Vec<ProductRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn found(keyword: impl Into<String>, items: Vec<ProductRecord>) -> Self {
        Self {
            keyword: keyword.into(),
            items,
            error: None,
        }
    }

    pub fn failed(keyword: impl Into<String>, error: impl ToString) -> Self {
        Self {
            keyword: keyword.into(),
            items: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
