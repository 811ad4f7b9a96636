pub mod answers;
pub mod leaderboard;
pub mod schema;
pub mod users;

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ErrorCode};

use crate::models::{Language, OptionLabel, Subject};

pub type DBResult<T> = Result<T, rusqlite::Error>;

/// Opens the database at `path`.
pub fn connect(path: impl AsRef<Path>) -> DBResult<Connection> {
    let connection = Connection::open(path)?;
    configure(&connection)?;
    Ok(connection)
}

/// Opens a private, empty database. Mostly useful for tests.
pub fn connect_in_memory() -> DBResult<Connection> {
    let connection = Connection::open_in_memory()?;
    configure(&connection)?;
    Ok(connection)
}

fn configure(connection: &Connection) -> DBResult<()> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.busy_timeout(Duration::from_secs(5))
}

pub fn initialize_db(connection: &Connection) -> DBResult<()> {
    log::debug!("[initialize_db] creating Users table...");
    connection.execute(schema::USERS_SCHEMA, [])?;

    log::debug!("[initialize_db] creating Answers table...");
    connection.execute(schema::ANSWERS_SCHEMA, [])?;
    connection.execute(schema::ANSWERS_USER_INDEX, [])?;

    Ok(())
}

/// Maps a constraint violation to `Ok(false)`, for inserts that are allowed to be no-ops.
pub fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Ok(false),
        _ => Err(err),
    }
}

fn invalid_text(kind: &str, text: &str) -> FromSqlError {
    FromSqlError::Other(format!("invalid {kind}: '{text}'").into())
}

impl FromSql for Language {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse().map_err(|_| invalid_text("language", text))
    }
}

impl ToSql for Language {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Subject {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse().map_err(|_| invalid_text("subject", text))
    }
}

impl ToSql for Subject {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for OptionLabel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        OptionLabel::parse(text).ok_or_else(|| invalid_text("option label", text))
    }
}

impl ToSql for OptionLabel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::Connection;

    use super::{connect_in_memory, initialize_db};

    /// A fresh in-memory database with the schema applied.
    pub fn database() -> Connection {
        let connection = connect_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        connection
    }
}
