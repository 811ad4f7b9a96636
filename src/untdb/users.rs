use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{self, StreakState, UserId};
use crate::streak;
use crate::untdb::DBResult;

/////*============== USER QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let last_practice_date = row
            .get::<_, Option<String>>("last_practice_date")?
            .as_deref()
            .and_then(streak::parse_practice_date);

        Ok(Self {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            language: row.get("language")?,
            subject: row.get("subject")?,
            topic: row.get("topic")?,
            pending_question_id: row.get("pending_question_id")?,
            streak: StreakState {
                current: row.get("current_streak")?,
                best: row.get("best_streak")?,
            },
            last_practice_date,
        })
    }
}

/// Returns the user with id `user_id`, if they exist.
pub fn query_user(connection: &Connection, user_id: UserId) -> DBResult<Option<models::User>> {
    connection
        .prepare("SELECT * FROM Users WHERE user_id = :user_id")?
        .query(rusqlite::named_params! { ":user_id": user_id })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Inserts a new user with default settings, doing nothing if they're already there.
/// Returns `true` if the user was newly added.
pub fn insert_user(connection: &Connection, user_id: UserId, display_name: &str) -> DBResult<bool> {
    log::trace!("[insert_user] Inserting user {user_id} into Users...");

    let now = Utc::now().timestamp_millis();
    let query_params = rusqlite::named_params! {
            ":user_id":      user_id,
            ":display_name": display_name,
            ":created_at":   now,
            ":last_active":  now,
    };

    let inserted = connection
        .prepare(
            "INSERT INTO Users ( user_id,  display_name,  created_at,  last_active)
             VALUES            (:user_id, :display_name, :created_at, :last_active)",
        )?
        .execute(query_params)
        .map_or_else(crate::untdb::swallow_constraint_violation, |_| Ok(true))?;

    if inserted {
        log::info!("User {display_name} ({user_id}) has been added to the database.");
    }

    Ok(inserted)
}

/// Returns the user with id `user_id`, creating them first if needed.
/// Refreshes their display name and activity timestamp either way.
pub fn ensure_user(connection: &Connection, user_id: UserId, display_name: &str) -> DBResult<models::User> {
    insert_user(connection, user_id, display_name)?;

    connection
        .prepare(
            "UPDATE Users SET display_name = :display_name, last_active = :last_active
             WHERE user_id = :user_id",
        )?
        .execute(rusqlite::named_params! {
            ":user_id":      user_id,
            ":display_name": display_name,
            ":last_active":  Utc::now().timestamp_millis(),
        })?;

    query_user(connection, user_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Writes back the per-session fields of `user`: language, subject, topic and pending question.
///
/// Streak fields are owned by [`update_streak`] and are left untouched.
pub fn update_session(connection: &Connection, user: &models::User) -> DBResult<()> {
    let query_params = rusqlite::named_params! {
            ":user_id":             user.user_id,
            ":display_name":        user.display_name,
            ":language":            user.language,
            ":subject":             user.subject,
            ":topic":               user.topic,
            ":pending_question_id": user.pending_question_id,
    };

    connection
        .prepare(
            "UPDATE Users SET
                display_name = :display_name,
                language = :language,
                subject = :subject,
                topic = :topic,
                pending_question_id = :pending_question_id
             WHERE user_id = :user_id",
        )?
        .execute(query_params)
        .inspect_err(|err| log::error!("[update_session] Could not update session of {}: {err}", user.user_id))?;

    Ok(())
}

/// Sets or clears the question the user is expected to answer next.
pub fn set_pending_question(connection: &Connection, user_id: UserId, question_id: Option<i64>) -> DBResult<()> {
    connection
        .prepare("UPDATE Users SET pending_question_id = :question_id WHERE user_id = :user_id")?
        .execute(rusqlite::named_params! { ":user_id": user_id, ":question_id": question_id })?;

    Ok(())
}

/// Clears the pending question if it is still `question_id`.
///
/// Returns `false` when the question was already answered or replaced.
pub fn claim_pending_question(connection: &Connection, user_id: UserId, question_id: i64) -> DBResult<bool> {
    let claimed = connection
        .prepare(
            "UPDATE Users SET pending_question_id = NULL
             WHERE user_id = :user_id AND pending_question_id = :question_id",
        )?
        .execute(rusqlite::named_params! { ":user_id": user_id, ":question_id": question_id })?;

    Ok(claimed == 1)
}

/// Advances the user's streak for a practice on `today` and stores the result.
///
/// Returns `None` if no such user is in the database.
pub fn update_streak(connection: &Connection, user_id: UserId, today: NaiveDate) -> DBResult<Option<StreakState>> {
    log::trace!("[update_streak] Updating streak for {user_id}...");

    let stored = connection
        .prepare("SELECT current_streak, best_streak, last_practice_date FROM Users WHERE user_id = ?")?
        .query_row([user_id], |row| {
            Ok((
                StreakState { current: row.get(0)?, best: row.get(1)? },
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .optional()?;

    let Some((previous, last_practice)) = stored else {
        return Ok(None);
    };

    let last_practice = last_practice.as_deref().and_then(streak::parse_practice_date);
    let updated = previous.after_practice(today, last_practice);

    connection
        .prepare(
            "UPDATE Users SET
                current_streak = :current,
                best_streak = :best,
                last_practice_date = :today
             WHERE user_id = :user_id",
        )?
        .execute(rusqlite::named_params! {
            ":user_id": user_id,
            ":current": updated.current,
            ":best":    updated.best,
            ":today":   streak::format_practice_date(today),
        })?;

    if updated.current != previous.current {
        log::info!("[update_streak] {user_id}'s streak is now {} (best {})", updated.current, updated.best);
    }

    Ok(Some(updated))
}

/// Returns the user's current and best streak; zeros for unknown users.
pub fn current_streak_of(connection: &Connection, user_id: UserId) -> DBResult<StreakState> {
    log::trace!("[current_streak_of] Querying streak for {user_id}...");
    let streak = connection
        .prepare("SELECT current_streak, best_streak FROM Users WHERE user_id = ?")?
        .query_row([user_id], |row| Ok(StreakState { current: row.get(0)?, best: row.get(1)? }))
        .optional()?;

    Ok(streak.unwrap_or_default())
}
