use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Language, OptionLabel};

/// A text available in every supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText {
    pub en: String,
    pub ru: String,
    pub kk: String,
}

impl LocalizedText {
    /// The text in `language`, or the English text if that variant is empty.
    pub fn get(&self, language: Language) -> &str {
        let text = match language {
            Language::En => &self.en,
            Language::Ru => &self.ru,
            Language::Kk => &self.kk,
        };

        if text.trim().is_empty() { &self.en } else { text }
    }
}

/// A validated, immutable question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub id: i64,
    pub topic: String,
    pub question: LocalizedText,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct: OptionLabel,
    pub explanation: LocalizedText,
}

impl QuestionRecord {
    pub fn option_text(&self, label: OptionLabel) -> &str {
        self.options.get(&label).map(String::as_str).unwrap_or_default()
    }
}

/// Why a question was refused at load time.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Shape(String),
    #[error("question {id}: missing or empty field '{field}'")]
    MissingText { id: i64, field: &'static str },
    #[error("question {id}: missing or empty option {label}")]
    MissingOption { id: i64, label: OptionLabel },
    #[error("question {id}: unexpected option '{label}'")]
    ExtraOption { id: i64, label: String },
    #[error("question {id}: correct answer '{label}' is not one of A-E")]
    InvalidCorrect { id: i64, label: String },
    #[error("question {id}: id is used more than once")]
    DuplicateId { id: i64 },
}

/// A question as it appears in a source file, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawQuestion {
    id: i64,
    #[serde(default)]
    topic: String,

    #[serde(default)]
    question_en: String,
    #[serde(default)]
    question_ru: String,
    #[serde(default)]
    question_kk: String,

    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default)]
    correct: String,

    #[serde(default)]
    explanation_en: String,
    #[serde(default)]
    explanation_ru: String,
    #[serde(default)]
    explanation_kk: String,
}

impl RawQuestion {
    pub(crate) fn id(&self) -> i64 {
        self.id
    }
}

fn require(id: i64, field: &'static str, value: String) -> Result<String, RecordError> {
    if value.trim().is_empty() {
        Err(RecordError::MissingText { id, field })
    } else {
        Ok(value)
    }
}

impl TryFrom<RawQuestion> for QuestionRecord {
    type Error = RecordError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let id = raw.id;

        let mut options = BTreeMap::new();
        for (label, text) in raw.options {
            let parsed = OptionLabel::ALL
                .into_iter()
                .find(|candidate| candidate.as_str() == label)
                .ok_or_else(|| RecordError::ExtraOption { id, label: label.clone() })?;
            options.insert(parsed, text);
        }
        for label in OptionLabel::ALL {
            if options.get(&label).is_none_or(|text| text.trim().is_empty()) {
                return Err(RecordError::MissingOption { id, label });
            }
        }

        let correct = OptionLabel::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == raw.correct)
            .ok_or(RecordError::InvalidCorrect { id, label: raw.correct })?;

        Ok(QuestionRecord {
            id,
            topic: require(id, "topic", raw.topic)?,
            question: LocalizedText {
                en: require(id, "question_en", raw.question_en)?,
                ru: require(id, "question_ru", raw.question_ru)?,
                kk: require(id, "question_kk", raw.question_kk)?,
            },
            options,
            correct,
            explanation: LocalizedText {
                en: require(id, "explanation_en", raw.explanation_en)?,
                ru: require(id, "explanation_ru", raw.explanation_ru)?,
                kk: require(id, "explanation_kk", raw.explanation_kk)?,
            },
        })
    }
}
