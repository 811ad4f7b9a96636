//! The question store: static, per-subject question banks loaded from JSON.
//!
//! Banks are read on first use and cached for the life of the store. A bank is
//! only replaced through [`QuestionStore::reload`].

pub mod bank;
pub mod record;
pub mod render;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::models::{Language, Subject};

pub use bank::QuestionBank;
pub use record::{LocalizedText, QuestionRecord};
pub use render::RenderedQuestion;

/// A subject's questions could not be loaded. Other subjects are unaffected.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no question source for {subject} at {}", path.display())]
    Missing { subject: Subject, path: PathBuf },
    #[error("could not read question source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed question source for {subject}: {source}")]
    Malformed {
        subject: Subject,
        #[source]
        source: serde_json::Error,
    },
}

pub struct QuestionStore {
    dir: PathBuf,
    banks: RwLock<HashMap<Subject, Arc<QuestionBank>>>,
}

impl QuestionStore {
    /// A store reading subject files from `dir`. Nothing is loaded yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            banks: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the subject's bank, reading it from disk on first use.
    pub fn load(&self, subject: Subject) -> Result<Arc<QuestionBank>, LoadError> {
        let cached = self
            .banks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&subject)
            .cloned();

        match cached {
            Some(bank) => Ok(bank),
            None => self.reload(subject),
        }
    }

    /// Reads the subject's source again and replaces the cached bank.
    ///
    /// On failure the previously cached bank, if any, stays in place.
    pub fn reload(&self, subject: Subject) -> Result<Arc<QuestionBank>, LoadError> {
        let bank = Arc::new(self.read_bank(subject)?);

        // Two first loads may race here; both read the same file, so either result will do.
        self.banks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject, bank.clone());

        Ok(bank)
    }

    fn read_bank(&self, subject: Subject) -> Result<QuestionBank, LoadError> {
        let path = self.dir.join(subject.file_name());
        log::debug!("[read_bank] Reading {subject} questions from {}", path.display());

        let source = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::Missing { subject, path: path.clone() },
            _ => LoadError::Io { path: path.clone(), source },
        })?;

        QuestionBank::from_json(subject, &source).map_err(|source| LoadError::Malformed { subject, source })
    }

    fn available(&self, subject: Subject) -> Option<Arc<QuestionBank>> {
        self.load(subject)
            .inspect_err(|err| log::error!("[QuestionStore] {subject} is unavailable: {err}"))
            .ok()
    }

    /// Topics of `subject`, sorted. Empty if the subject can't be loaded.
    pub fn topics(&self, subject: Subject) -> Vec<String> {
        self.available(subject)
            .map(|bank| bank.topics().to_vec())
            .unwrap_or_default()
    }

    pub fn get(&self, subject: Subject, id: i64) -> Option<Arc<QuestionRecord>> {
        self.available(subject)?.get(id).cloned()
    }

    /// A uniformly random question of `subject`, optionally restricted to `topic`,
    /// rendered in `language`.
    ///
    /// Draws are independent: the same question may come up twice in a row.
    pub fn select_random(&self, subject: Subject, topic: Option<&str>, language: Language) -> Option<RenderedQuestion> {
        let bank = self.available(subject)?;
        let record = *bank.filtered(topic).choose(&mut rand::rng())?;

        Some(record.render(subject, language))
    }
}
