use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;

use crate::models::Subject;
use crate::questions::record::{QuestionRecord, RawQuestion, RecordError};

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    topics: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawBank {
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    questions: Vec<serde_json::Value>,
}

/// All valid questions of one subject.
#[derive(Debug)]
pub struct QuestionBank {
    pub subject: Subject,
    topics: Vec<String>,
    records: Vec<Arc<QuestionRecord>>,
    rejected: usize,
}

impl QuestionBank {
    /// Parses a subject's source document.
    ///
    /// A document that isn't valid JSON fails as a whole. Individual records that
    /// break the record invariants are dropped and logged; the rest stay usable.
    pub fn from_json(subject: Subject, source: &str) -> Result<QuestionBank, serde_json::Error> {
        let raw: RawBank = serde_json::from_str(source)?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut rejected = 0;

        for value in raw.questions {
            let validated = serde_json::from_value::<RawQuestion>(value)
                .map_err(|err| RecordError::Shape(err.to_string()))
                .and_then(|question| {
                    if seen.insert(question.id()) {
                        QuestionRecord::try_from(question)
                    } else {
                        Err(RecordError::DuplicateId { id: question.id() })
                    }
                });

            match validated {
                Ok(record) => records.push(Arc::new(record)),
                Err(err) => {
                    log::warn!("[QuestionBank::from_json] Rejected a {subject} question: {err}");
                    rejected += 1;
                }
            }
        }

        log::info!(
            "Loaded {} {subject} questions ({rejected} rejected), {} topics.",
            records.len(),
            raw.metadata.topics.len()
        );

        Ok(QuestionBank {
            subject,
            topics: raw.metadata.topics.into_keys().collect(),
            records,
            rejected,
        })
    }

    /// Topic identifiers declared in the source's metadata, in sorted order.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn records(&self) -> &[Arc<QuestionRecord>] {
        &self.records
    }

    /// Number of records dropped during validation.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn get(&self, id: i64) -> Option<&Arc<QuestionRecord>> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Records on `topic`, or every record when no topic is given.
    pub fn filtered(&self, topic: Option<&str>) -> Vec<&Arc<QuestionRecord>> {
        self.records
            .iter()
            .filter(|record| topic.is_none_or(|topic| record.topic == topic))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = include_str!("../../testdata/math_questions.json");

    #[test]
    fn drops_invalid_records() {
        let bank = QuestionBank::from_json(Subject::Math, SOURCE).unwrap();
        let ids = bank.records().iter().map(|record| record.id).collect::<Vec<_>>();

        assert_eq!(ids, [1, 2]);
        assert_eq!(bank.rejected(), 4);
    }

    #[test]
    fn reads_topics_from_metadata() {
        let bank = QuestionBank::from_json(Subject::Math, SOURCE).unwrap();
        assert_eq!(bank.topics(), ["algebra", "geometry"]);
    }

    #[test]
    fn filters_by_topic() {
        let bank = QuestionBank::from_json(Subject::Math, SOURCE).unwrap();
        assert_eq!(bank.filtered(None).len(), 2);
        assert_eq!(bank.filtered(Some("geometry")).len(), 1);
        assert!(bank.filtered(Some("calculus")).is_empty());
        assert_eq!(bank.get(2).unwrap().topic, "geometry");
        assert!(bank.get(5).is_none());
    }

    #[test]
    fn tolerates_missing_sections() {
        let bank = QuestionBank::from_json(Subject::Biology, "{}").unwrap();
        assert!(bank.topics().is_empty());
        assert!(bank.records().is_empty());
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(QuestionBank::from_json(Subject::Biology, "{ \"questions\": [").is_err());
        assert!(QuestionBank::from_json(Subject::Biology, "{ \"questions\": 4 }").is_err());
    }
}
