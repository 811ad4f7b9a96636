use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};

/// Opaque numeric id handed to us by the chat transport.
pub type UserId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    #[default]
    En,
    Ru,
    Kk,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ru, Language::Kk];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Kk => "kk",
        }
    }

    /// English name of the language, used when instructing the explanation service.
    pub fn english_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ru => "Russian",
            Language::Kk => "Kazakh",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ru" | "russian" | "русский" => Ok(Language::Ru),
            "kk" | "kz" | "kazakh" | "қазақша" => Ok(Language::Kk),
            other => Err(anyhow!("Unknown language: {other} (expected en, ru or kk)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Math,
    Reading,
    History,
    Physics,
    Chemistry,
    Biology,
    Geography,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::Math,
        Subject::Reading,
        Subject::History,
        Subject::Physics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::Geography,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Reading => "reading",
            Subject::History => "history",
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
            Subject::Geography => "geography",
        }
    }

    /// Name of the static question source for this subject.
    pub fn file_name(self) -> &'static str {
        match self {
            Subject::Math => "math_questions.json",
            Subject::Reading => "reading_questions.json",
            Subject::History => "history_questions.json",
            Subject::Physics => "physics_questions.json",
            Subject::Chemistry => "chemistry_questions.json",
            Subject::Biology => "biology_questions.json",
            Subject::Geography => "geography.json",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Subject {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        if code == "mathematics" {
            return Ok(Subject::Math);
        }

        Subject::ALL
            .into_iter()
            .find(|subject| subject.code() == code)
            .ok_or_else(|| anyhow!("Unknown subject: {code}"))
    }
}

/// Label of one of the five answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 5] = [
        OptionLabel::A,
        OptionLabel::B,
        OptionLabel::C,
        OptionLabel::D,
        OptionLabel::E,
    ];

    /// Parses a label leniently: surrounding whitespace and case are ignored.
    pub fn parse(raw: &str) -> Option<OptionLabel> {
        match raw.trim().to_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            "E" => Some(OptionLabel::E),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
            OptionLabel::E => "E",
        }
    }
}

impl std::fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub display_name: String,
    pub language: Language,

    pub subject: Option<Subject>,
    pub topic: Option<String>,
    pub pending_question_id: Option<i64>,

    pub streak: StreakState,
    pub last_practice_date: Option<NaiveDate>,
}

/// One submitted answer. Rows of this kind are only ever appended.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEvent {
    pub id: i64,
    pub user_id: UserId,
    pub subject: Subject,
    pub question_id: i64,

    /// Exactly what the user sent, valid label or not.
    pub submitted: String,
    /// The answer key as it was when the answer was graded.
    pub correct: OptionLabel,
    pub is_correct: bool,

    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total: u64,
    pub correct: u64,
    pub accuracy_percent: f64,
}

impl Aggregate {
    /// Builds an aggregate from raw counts. Returns `None` when nothing was answered.
    pub fn from_counts(total: u64, correct: u64) -> Option<Aggregate> {
        (total > 0).then(|| Aggregate {
            total,
            correct,
            accuracy_percent: accuracy_percent(correct, total),
        })
    }
}

/// `correct / total * 100`, rounded to one decimal place. `total` must be non-zero.
pub fn accuracy_percent(correct: u64, total: u64) -> f64 {
    (correct as f64 / total as f64 * 1000.0).round() / 10.0
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: UserId,
    pub display_name: String,

    pub correct: u64,
    pub total: u64,
    pub accuracy_percent: f64,

    pub current_streak: u32,
}

impl std::fmt::Display for Standing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**{}**: {}/{} ({}%) 🔥{}",
            self.display_name, self.correct, self.total, self.accuracy_percent, self.current_streak
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_rounds_to_one_decimal() {
        assert_eq!(accuracy_percent(2, 3), 66.7);
        assert_eq!(accuracy_percent(1, 3), 33.3);
        assert_eq!(accuracy_percent(5, 5), 100.0);
        assert_eq!(accuracy_percent(0, 4), 0.0);
    }

    #[test]
    fn aggregate_requires_answers() {
        assert_eq!(Aggregate::from_counts(0, 0), None);

        let aggregate = Aggregate::from_counts(3, 2).unwrap();
        assert_eq!(aggregate.total, 3);
        assert_eq!(aggregate.correct, 2);
        assert_eq!(aggregate.accuracy_percent, 66.7);
    }

    #[test]
    fn option_labels_parse_leniently() {
        assert_eq!(OptionLabel::parse(" b "), Some(OptionLabel::B));
        assert_eq!(OptionLabel::parse("E"), Some(OptionLabel::E));
        assert_eq!(OptionLabel::parse("F"), None);
        assert_eq!(OptionLabel::parse("AB"), None);
        assert_eq!(OptionLabel::parse(""), None);
    }

    #[test]
    fn subjects_parse_codes_and_aliases() {
        assert_eq!("Math".parse::<Subject>().unwrap(), Subject::Math);
        assert_eq!("mathematics".parse::<Subject>().unwrap(), Subject::Math);
        assert_eq!(" geography ".parse::<Subject>().unwrap(), Subject::Geography);
        assert!("astrology".parse::<Subject>().is_err());
    }

    #[test]
    fn languages_parse_codes_and_names() {
        assert_eq!("RU".parse::<Language>().unwrap(), Language::Ru);
        assert_eq!("қазақша".parse::<Language>().unwrap(), Language::Kk);
        assert_eq!("english".parse::<Language>().unwrap(), Language::En);
        assert!("de".parse::<Language>().is_err());
    }
}
