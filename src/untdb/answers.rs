use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::models::{self, Aggregate, OptionLabel, Subject, UserId};
use crate::untdb::DBResult;

/////*============== ANSWER LEDGER ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::AnswerEvent {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let answered_at: i64 = row.get("answered_at")?;

        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            subject: row.get("subject")?,
            question_id: row.get("question_id")?,
            submitted: row.get("submitted")?,
            correct: row.get("correct_label")?,
            is_correct: row.get("is_correct")?,
            answered_at: DateTime::from_timestamp_millis(answered_at).unwrap_or_default(),
        })
    }
}

/// Appends one answer to the ledger and returns it.
///
/// Any `submitted` text is accepted; anything that isn't the correct label is
/// recorded as a wrong answer.
pub fn record(
    connection: &Connection,
    user_id: UserId,
    subject: Subject,
    question_id: i64,
    submitted: &str,
    correct: OptionLabel,
) -> DBResult<models::AnswerEvent> {
    log::trace!("[record] Recording answer of {user_id} to {subject}#{question_id}...");

    let is_correct = OptionLabel::parse(submitted) == Some(correct);
    let answered_at = Utc::now();

    let query_params = rusqlite::named_params! {
            ":user_id":       user_id,
            ":subject":       subject,
            ":question_id":   question_id,
            ":submitted":     submitted,
            ":correct_label": correct,
            ":is_correct":    is_correct,
            ":answered_at":   answered_at.timestamp_millis(),
    };

    connection
        .prepare(
            "INSERT INTO Answers
                ( user_id,  subject,  question_id,  submitted,  correct_label,  is_correct,  answered_at)
            VALUES
                (:user_id, :subject, :question_id, :submitted, :correct_label, :is_correct, :answered_at)",
        )?
        .execute(query_params)
        .inspect_err(|err| log::error!("[record] Could not record answer of {user_id}: {err}"))?;

    Ok(models::AnswerEvent {
        id: connection.last_insert_rowid(),
        user_id,
        subject,
        question_id,
        submitted: submitted.to_string(),
        correct,
        is_correct,
        // Millisecond precision, same as what was stored.
        answered_at: DateTime::from_timestamp_millis(answered_at.timestamp_millis()).unwrap_or(answered_at),
    })
}

/// Totals over every answer the user has given. `None` if they have answered nothing.
pub fn aggregate_for(connection: &Connection, user_id: UserId) -> DBResult<Option<Aggregate>> {
    let (total, correct) = connection
        .prepare(
            "SELECT COUNT(*) AS total, COALESCE(SUM(is_correct), 0) AS correct
             FROM Answers
             WHERE user_id = :user_id",
        )?
        .query_row(rusqlite::named_params! { ":user_id": user_id }, |row| {
            Ok((row.get::<_, u64>("total")?, row.get::<_, u64>("correct")?))
        })?;

    Ok(Aggregate::from_counts(total, correct))
}

/// Totals per subject, one entry for every subject the user has answered in.
pub fn aggregate_by_subject(connection: &Connection, user_id: UserId) -> DBResult<BTreeMap<Subject, Aggregate>> {
    let mut stmt = connection.prepare(
        "SELECT subject, COUNT(*) AS total, SUM(is_correct) AS correct
         FROM Answers
         WHERE user_id = :user_id
         GROUP BY subject",
    )?;

    let rows = stmt
        .query_map(rusqlite::named_params! { ":user_id": user_id }, |row| {
            Ok((
                row.get::<_, Subject>("subject")?,
                row.get::<_, u64>("total")?,
                row.get::<_, u64>("correct")?,
            ))
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .filter_map(|(subject, total, correct)| Some((subject, Aggregate::from_counts(total, correct)?)))
        .collect())
}

/// The user's most recent answers, newest first.
pub fn history(connection: &Connection, user_id: UserId, limit: usize) -> DBResult<Vec<models::AnswerEvent>> {
    let mut stmt = connection.prepare(
        "SELECT * FROM Answers
         WHERE user_id = :user_id
         ORDER BY answered_at DESC, id DESC
         LIMIT :limit",
    )?;

    let events = stmt
        .query_map(
            rusqlite::named_params! { ":user_id": user_id, ":limit": limit as i64 },
            |row| models::AnswerEvent::try_from(row),
        )?
        .collect::<DBResult<Vec<models::AnswerEvent>>>()?;

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::untdb::{testing, users};

    fn setup() -> Connection {
        let connection = testing::database();
        users::ensure_user(&connection, 1, "Aru").unwrap();
        users::ensure_user(&connection, 2, "Bek").unwrap();
        connection
    }

    #[test]
    fn no_answers_no_aggregate() {
        let connection = setup();
        assert_eq!(aggregate_for(&connection, 1).unwrap(), None);
        assert!(aggregate_by_subject(&connection, 1).unwrap().is_empty());
    }

    #[test]
    fn two_of_three_is_66_7_percent() {
        let connection = setup();
        record(&connection, 1, Subject::Math, 1, "A", OptionLabel::A).unwrap();
        record(&connection, 1, Subject::Math, 2, "B", OptionLabel::C).unwrap();
        record(&connection, 1, Subject::Math, 3, "d", OptionLabel::D).unwrap();

        let aggregate = aggregate_for(&connection, 1).unwrap().unwrap();
        assert_eq!(aggregate.total, 3);
        assert_eq!(aggregate.correct, 2);
        assert_eq!(aggregate.accuracy_percent, 66.7);
    }

    #[test]
    fn invalid_labels_are_recorded_as_wrong() {
        let connection = setup();
        let event = record(&connection, 1, Subject::History, 9, "Z", OptionLabel::A).unwrap();
        assert!(!event.is_correct);
        assert_eq!(event.submitted, "Z");

        let event = record(&connection, 1, Subject::History, 9, "", OptionLabel::A).unwrap();
        assert!(!event.is_correct);

        assert_eq!(aggregate_for(&connection, 1).unwrap().unwrap().total, 2);
    }

    #[test]
    fn aggregates_split_by_subject() {
        let connection = setup();
        record(&connection, 1, Subject::Math, 1, "A", OptionLabel::A).unwrap();
        record(&connection, 1, Subject::Math, 2, "A", OptionLabel::B).unwrap();
        record(&connection, 1, Subject::Physics, 1, "E", OptionLabel::E).unwrap();
        record(&connection, 2, Subject::Biology, 1, "E", OptionLabel::E).unwrap();

        let by_subject = aggregate_by_subject(&connection, 1).unwrap();
        assert_eq!(by_subject.len(), 2);
        assert_eq!(by_subject[&Subject::Math].accuracy_percent, 50.0);
        assert_eq!(by_subject[&Subject::Physics].accuracy_percent, 100.0);
        assert!(!by_subject.contains_key(&Subject::Biology));
    }

    #[test]
    fn history_is_newest_first() {
        let connection = setup();
        let first = record(&connection, 1, Subject::Math, 1, "A", OptionLabel::A).unwrap();
        let second = record(&connection, 1, Subject::Math, 2, "B", OptionLabel::A).unwrap();

        let events = history(&connection, 1, 10).unwrap();
        assert_eq!(events, vec![second.clone(), first]);
        assert_eq!(history(&connection, 1, 1).unwrap(), vec![second]);
        assert!(history(&connection, 2, 10).unwrap().is_empty());
    }
}
