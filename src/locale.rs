//! User-facing phrases in every supported language.

use crate::models::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    Correct,
    Incorrect,
    NoQuestions,
    NoPendingQuestion,
    NoStats,
    AiUnavailable,
    LanguageSet,
    SubjectSet,
    TopicSet,
    TopicCleared,
    UnknownTopic,
    TopicsTitle,
    NoTopics,
    ReadyMore,
    ProgressTitle,
    TotalQuestions,
    CorrectAnswers,
    Accuracy,
    Streak,
    BestStreak,
    Rank,
    Unranked,
    LeaderboardTitle,
    EmptyLeaderboard,
    HistoryTitle,
}

impl Phrase {
    pub fn text(self, language: Language) -> &'static str {
        use Language::*;
        use Phrase::*;

        match (self, language) {
            (Correct, En) => "Correct!",
            (Correct, Ru) => "Правильно!",
            (Correct, Kk) => "Дұрыс!",

            (Incorrect, En) => "Incorrect.",
            (Incorrect, Ru) => "Неправильно.",
            (Incorrect, Kk) => "Қате.",

            (NoQuestions, En) => "No questions are available for this selection yet.",
            (NoQuestions, Ru) => "Для этого выбора пока нет вопросов.",
            (NoQuestions, Kk) => "Бұл таңдау бойынша әзірге сұрақтар жоқ.",

            (NoPendingQuestion, En) => "Start a practice question first.",
            (NoPendingQuestion, Ru) => "Сначала начните практику.",
            (NoPendingQuestion, Kk) => "Алдымен жаттығуды бастаңыз.",

            (NoStats, En) => "You haven't answered any questions yet.",
            (NoStats, Ru) => "Вы ещё не ответили ни на один вопрос.",
            (NoStats, Kk) => "Сіз әлі бірде-бір сұраққа жауап бермедіңіз.",

            (AiUnavailable, En) => "⚠️ AI temporarily unavailable. Please try again.",
            (AiUnavailable, Ru) => "⚠️ ИИ временно недоступен. Попробуйте ещё раз.",
            (AiUnavailable, Kk) => "⚠️ ЖИ уақытша қолжетімсіз. Қайталап көріңіз.",

            (LanguageSet, En) => "Language set to English.",
            (LanguageSet, Ru) => "Язык изменён на русский.",
            (LanguageSet, Kk) => "Тіл қазақшаға ауыстырылды.",

            (SubjectSet, En) => "Subject selected:",
            (SubjectSet, Ru) => "Выбран предмет:",
            (SubjectSet, Kk) => "Таңдалған пән:",

            (TopicSet, En) => "Topic selected:",
            (TopicSet, Ru) => "Выбрана тема:",
            (TopicSet, Kk) => "Таңдалған тақырып:",

            (TopicCleared, En) => "Practicing all topics.",
            (TopicCleared, Ru) => "Практика по всем темам.",
            (TopicCleared, Kk) => "Барлық тақырыптар бойынша жаттығу.",

            (UnknownTopic, En) => "No such topic in this subject.",
            (UnknownTopic, Ru) => "В этом предмете нет такой темы.",
            (UnknownTopic, Kk) => "Бұл пәнде мұндай тақырып жоқ.",

            (TopicsTitle, En) => "**Topics:**",
            (TopicsTitle, Ru) => "**Темы:**",
            (TopicsTitle, Kk) => "**Тақырыптар:**",

            (NoTopics, En) => "This subject has no topics.",
            (NoTopics, Ru) => "У этого предмета нет тем.",
            (NoTopics, Kk) => "Бұл пәнде тақырыптар жоқ.",

            (ReadyMore, En) => "Ready for more? Send `next`.",
            (ReadyMore, Ru) => "Готовы продолжить? Отправьте `next`.",
            (ReadyMore, Kk) => "Жалғастырамыз ба? `next` жіберіңіз.",

            (ProgressTitle, En) => "📊 **Your progress**",
            (ProgressTitle, Ru) => "📊 **Ваш прогресс**",
            (ProgressTitle, Kk) => "📊 **Сіздің үлгеріміңіз**",

            (TotalQuestions, En) => "Questions answered",
            (TotalQuestions, Ru) => "Всего ответов",
            (TotalQuestions, Kk) => "Барлық жауаптар",

            (CorrectAnswers, En) => "Correct answers",
            (CorrectAnswers, Ru) => "Правильных ответов",
            (CorrectAnswers, Kk) => "Дұрыс жауаптар",

            (Accuracy, En) => "Accuracy",
            (Accuracy, Ru) => "Точность",
            (Accuracy, Kk) => "Дәлдік",

            (Streak, En) => "Streak",
            (Streak, Ru) => "Серия",
            (Streak, Kk) => "Серия",

            (BestStreak, En) => "best",
            (BestStreak, Ru) => "рекорд",
            (BestStreak, Kk) => "рекорд",

            (Rank, En) => "Rank",
            (Rank, Ru) => "Место",
            (Rank, Kk) => "Орын",

            (Unranked, En) => "Answer a question to join the leaderboard.",
            (Unranked, Ru) => "Ответьте на вопрос, чтобы попасть в рейтинг.",
            (Unranked, Kk) => "Рейтингке кіру үшін сұраққа жауап беріңіз.",

            (LeaderboardTitle, En) => "🏆 **Leaderboard**",
            (LeaderboardTitle, Ru) => "🏆 **Рейтинг**",
            (LeaderboardTitle, Kk) => "🏆 **Рейтинг**",

            (EmptyLeaderboard, En) => "Nobody has answered anything yet.",
            (EmptyLeaderboard, Ru) => "Пока никто не ответил.",
            (EmptyLeaderboard, Kk) => "Әзірге ешкім жауап бермеді.",

            (HistoryTitle, En) => "🕘 **Recent answers**",
            (HistoryTitle, Ru) => "🕘 **Последние ответы**",
            (HistoryTitle, Kk) => "🕘 **Соңғы жауаптар**",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phrase_is_translated() {
        let phrases = [
            Phrase::Correct,
            Phrase::NoQuestions,
            Phrase::AiUnavailable,
            Phrase::LeaderboardTitle,
            Phrase::HistoryTitle,
        ];

        for phrase in phrases {
            for language in Language::ALL {
                assert!(!phrase.text(language).is_empty());
            }
        }
        assert_ne!(Phrase::Correct.text(Language::En), Phrase::Correct.text(Language::Ru));
    }
}
