use std::cmp::Ordering;

use itertools::Itertools;
use rusqlite::Connection;

use crate::models::{self, Aggregate, UserId};
use crate::untdb::DBResult;

/////*============== LEADERBOARD ==============*/
/// Display and rank order: accuracy first, then number of correct answers.
/// The user id only keeps the order stable among exact ties.
fn standing_order(a: &models::Standing, b: &models::Standing) -> Ordering {
    b.accuracy_percent
        .total_cmp(&a.accuracy_percent)
        .then_with(|| b.correct.cmp(&a.correct))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Every user with at least one answer, best first.
pub fn standings(connection: &Connection) -> DBResult<Vec<models::Standing>> {
    log::trace!("[standings] Ranking all users with answers.");

    let mut stmt = connection.prepare(
        "SELECT u.user_id, u.display_name, u.current_streak,
                COUNT(*) AS total,
                SUM(a.is_correct) AS correct
         FROM Users u
         JOIN Answers a ON a.user_id = u.user_id
         GROUP BY u.user_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, UserId>("user_id")?,
                row.get::<_, String>("display_name")?,
                row.get::<_, u32>("current_streak")?,
                row.get::<_, u64>("total")?,
                row.get::<_, u64>("correct")?,
            ))
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(rows
        .into_iter()
        .filter_map(|(user_id, display_name, current_streak, total, correct)| {
            let aggregate = Aggregate::from_counts(total, correct)?;
            Some(models::Standing {
                user_id,
                display_name,
                correct: aggregate.correct,
                total: aggregate.total,
                accuracy_percent: aggregate.accuracy_percent,
                current_streak,
            })
        })
        .sorted_by(standing_order)
        .collect())
}

/// The first `n` entries of [`standings`].
pub fn top(connection: &Connection, n: usize) -> DBResult<Vec<models::Standing>> {
    Ok(standings(connection)?.into_iter().take(n).collect())
}

/// 1-based position of the user in [`standings`], or `None` if they have no answers.
pub fn rank_of(connection: &Connection, user_id: UserId) -> DBResult<Option<usize>> {
    Ok(standings(connection)?
        .iter()
        .position(|standing| standing.user_id == user_id)
        .map(|index| index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OptionLabel, Subject};
    use crate::untdb::{answers, testing, users};

    /// Records `correct` right answers followed by `wrong` wrong ones.
    fn answer(connection: &Connection, user_id: UserId, correct: usize, wrong: usize) {
        for question_id in 0..correct {
            answers::record(connection, user_id, Subject::Math, question_id as i64, "A", OptionLabel::A).unwrap();
        }
        for question_id in 0..wrong {
            answers::record(connection, user_id, Subject::Math, question_id as i64, "B", OptionLabel::A).unwrap();
        }
    }

    fn population() -> Connection {
        let connection = testing::database();
        for (user_id, name) in [(1, "Aru"), (2, "Bek"), (3, "Dana"), (4, "Erlan"), (5, "Idle")] {
            users::ensure_user(&connection, user_id, name).unwrap();
        }

        answer(&connection, 1, 2, 1); // 66.7%
        answer(&connection, 2, 4, 0); // 100%, 4 correct
        answer(&connection, 3, 1, 0); // 100%, 1 correct
        answer(&connection, 4, 4, 2); // 66.7%, 4 correct
        connection
    }

    #[test]
    fn orders_by_accuracy_then_correct() {
        let connection = population();
        let names = top(&connection, 10)
            .unwrap()
            .into_iter()
            .map(|standing| standing.display_name)
            .collect::<Vec<_>>();

        assert_eq!(names, ["Bek", "Dana", "Erlan", "Aru"]);
    }

    #[test]
    fn top_is_truncated() {
        let connection = population();
        let standings = top(&connection, 2).unwrap();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].accuracy_percent, 100.0);
        assert_eq!(standings[0].correct, 4);
        assert_eq!(standings[0].total, 4);
    }

    #[test]
    fn rank_matches_full_listing() {
        let connection = population();
        let everyone = top(&connection, usize::MAX).unwrap();

        for (index, standing) in everyone.iter().enumerate() {
            assert_eq!(rank_of(&connection, standing.user_id).unwrap(), Some(index + 1));
        }
    }

    #[test]
    fn users_without_answers_are_not_ranked() {
        let connection = population();
        assert!(top(&connection, 10).unwrap().iter().all(|standing| standing.user_id != 5));
        assert_eq!(rank_of(&connection, 5).unwrap(), None);
        assert_eq!(rank_of(&connection, 404).unwrap(), None);
    }

    #[test]
    fn shows_current_streak() {
        let connection = population();
        let today = chrono::NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        users::update_streak(&connection, 3, today).unwrap();

        let dana = top(&connection, 10)
            .unwrap()
            .into_iter()
            .find(|standing| standing.user_id == 3)
            .unwrap();
        assert_eq!(dana.current_streak, 1);
    }
}
