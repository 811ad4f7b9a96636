pub const USERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Users (
        user_id              INTEGER     PRIMARY KEY,
        display_name         TEXT        NOT NULL,
        language             TEXT        NOT NULL    DEFAULT 'en',

        subject              TEXT,
        topic                TEXT,
        pending_question_id  INTEGER,

        current_streak       INTEGER     NOT NULL    DEFAULT 0,
        best_streak          INTEGER     NOT NULL    DEFAULT 0,
        last_practice_date   TEXT,

        created_at           TIMESTAMP   NOT NULL,
        last_active          TIMESTAMP   NOT NULL
    )";

pub const ANSWERS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Answers (
        id               INTEGER     PRIMARY KEY AUTOINCREMENT,
        user_id          INTEGER     NOT NULL    REFERENCES Users(user_id),

        subject          TEXT        NOT NULL,
        question_id      INTEGER     NOT NULL,
        submitted        TEXT        NOT NULL,
        correct_label    TEXT        NOT NULL,
        is_correct       BOOLEAN     NOT NULL,

        answered_at      TIMESTAMP   NOT NULL
    )";

pub const ANSWERS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS AnswersByUser ON Answers (user_id)";
