//! One student's practice session, loaded per request and written back explicitly.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};

use crate::models::{Aggregate, AnswerEvent, Language, StreakState, Subject, User, UserId};
use crate::questions::{QuestionStore, RenderedQuestion};
use crate::untai::{LanguageModel, Tutor};
use crate::untdb::{answers, users};

/// Subject used until the student picks one.
pub const DEFAULT_SUBJECT: Subject = Subject::Math;

/// Outcome of grading the pending question.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub event: AnswerEvent,
    pub question: RenderedQuestion,
    pub streak: StreakState,
    /// Totals including this answer.
    pub aggregate: Option<Aggregate>,
}

impl GradedAnswer {
    pub fn correct_text(&self) -> String {
        self.question.option_text(self.event.correct.as_str())
    }

    pub fn submitted_text(&self) -> String {
        self.question.option_text(&self.event.submitted)
    }
}

#[derive(Debug, Clone)]
pub struct AnsweredQuestion {
    pub graded: GradedAnswer,
    pub ai_explanation: String,
}

pub struct PracticeContext {
    user: User,
}

impl PracticeContext {
    /// Loads the student's session, registering them on first contact.
    pub fn load(connection: &Connection, user_id: UserId, display_name: &str) -> Result<Self> {
        let user = users::ensure_user(connection, user_id, display_name)
            .with_context(|| format!("Couldn't load session of {display_name} ({user_id})"))?;

        Ok(Self { user })
    }

    pub fn save(&self, connection: &Connection) -> Result<()> {
        users::update_session(connection, &self.user)
            .with_context(|| format!("Couldn't save session of {}", self.user.user_id))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn language(&self) -> Language {
        self.user.language
    }

    pub fn subject(&self) -> Subject {
        self.user.subject.unwrap_or(DEFAULT_SUBJECT)
    }

    pub fn topic(&self) -> Option<&str> {
        self.user.topic.as_deref()
    }

    pub fn set_language(&mut self, language: Language) {
        self.user.language = language;
    }

    /// Switches subject. The topic filter and any unanswered question belong to
    /// the old subject and are dropped.
    pub fn set_subject(&mut self, subject: Subject) {
        self.user.subject = Some(subject);
        self.user.topic = None;
        self.user.pending_question_id = None;
    }

    /// Restricts practice to `topic`, or lifts the restriction with `None`.
    ///
    /// Returns `false`, changing nothing, if the current subject has no such topic.
    pub fn set_topic(&mut self, store: &QuestionStore, topic: Option<&str>) -> bool {
        let Some(topic) = topic else {
            self.user.topic = None;
            return true;
        };

        // Case doesn't matter to the student, but the key is stored as the source spells it.
        let wanted = topic.trim().to_lowercase();
        let Some(key) = store
            .topics(self.subject())
            .into_iter()
            .find(|key| key.to_lowercase() == wanted)
        else {
            log::debug!("[set_topic] {} has no topic '{topic}'", self.subject());
            return false;
        };

        self.user.topic = Some(key);
        true
    }

    /// Picks the next question for the student and makes it the pending one.
    pub fn next_question(&mut self, store: &QuestionStore) -> Option<RenderedQuestion> {
        let question = store.select_random(self.subject(), self.topic(), self.language())?;
        self.user.pending_question_id = Some(question.id);

        Some(question)
    }

    /// Grades `submitted` against the pending question.
    ///
    /// The answer, the streak update and the resulting totals are committed
    /// together. Returns `None` if there's nothing to answer.
    pub fn submit_answer(
        &mut self,
        connection: &mut Connection,
        store: &QuestionStore,
        today: NaiveDate,
        submitted: &str,
    ) -> Result<Option<GradedAnswer>> {
        let user_id = self.user.user_id;
        let Some(question_id) = self.user.pending_question_id else {
            return Ok(None);
        };

        let subject = self.subject();
        let Some(record) = store.get(subject, question_id) else {
            log::warn!("[submit_answer] Pending question {subject}#{question_id} of {user_id} no longer exists");
            self.user.pending_question_id = None;
            users::set_pending_question(connection, user_id, None)?;
            return Ok(None);
        };

        let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // A concurrent request may have answered it already.
        if !users::claim_pending_question(&transaction, user_id, question_id)? {
            log::debug!("[submit_answer] {subject}#{question_id} was already answered by {user_id}");
            self.user.pending_question_id = None;
            return Ok(None);
        }

        let event = answers::record(&transaction, user_id, subject, question_id, submitted, record.correct)?;
        let streak = users::update_streak(&transaction, user_id, today)?.unwrap_or_default();
        let aggregate = answers::aggregate_for(&transaction, user_id)?;
        transaction.commit().context("Couldn't commit answer")?;

        self.user.pending_question_id = None;
        self.user.streak = streak;
        self.user.last_practice_date = Some(today);

        Ok(Some(GradedAnswer {
            event,
            question: record.render(subject, self.language()),
            streak,
            aggregate,
        }))
    }

    /// Grades the answer, then asks the tutor about it.
    ///
    /// The answer is stored before the tutor is consulted; a failing tutor only
    /// changes the explanation text.
    pub async fn answer<M: LanguageModel>(
        &mut self,
        connection: &mut Connection,
        store: &QuestionStore,
        tutor: &Tutor<M>,
        today: NaiveDate,
        submitted: &str,
    ) -> Result<Option<AnsweredQuestion>> {
        let Some(graded) = self.submit_answer(connection, store, today, submitted)? else {
            return Ok(None);
        };

        let ai_explanation = tutor
            .explain_answer(
                &graded.question.text,
                &graded.correct_text(),
                &graded.submitted_text(),
                graded.event.is_correct,
                self.language(),
            )
            .await;

        Ok(Some(AnsweredQuestion { graded, ai_explanation }))
    }
}
