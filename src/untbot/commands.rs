use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use regex::Regex;
use rusqlite::Connection;

use crate::locale::Phrase;
use crate::models::{Language, OptionLabel, Subject, UserId};
use crate::practice::{AnsweredQuestion, PracticeContext};
use crate::untai::LanguageModel;
use crate::untbot::BotState;
use crate::untdb::{answers, leaderboard, users};

const MAX_CMD_LENGTH: usize = 12;
const DEFAULT_TOP: usize = 10;
const MAX_TOP: usize = 25;
const HISTORY_LENGTH: usize = 10;

static CMD_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("command syntax regex is valid"));

/// Who sent the message being handled.
#[derive(Debug, Clone, Copy)]
pub struct Author<'a> {
    pub id: UserId,
    pub name: &'a str,
}

struct CommandInstance<'a, M> {
    state: &'a BotState<M>,
    connection: &'a mut Connection,
    context: PracticeContext,

    command: &'a str,
    parameters: &'a [&'a str],
}

pub struct Commands;
impl Commands {
    /// Handles one chat message. Returns `None` for messages that aren't meant for the bot.
    ///
    /// Besides commands starting with the call token, a bare option label is
    /// taken as an answer, but only while the author has a question pending.
    pub async fn respond<M: LanguageModel>(
        state: &BotState<M>,
        connection: &mut Connection,
        author: Author<'_>,
        content: &str,
    ) -> Result<Option<String>> {
        let content = content.trim();

        match content.strip_prefix(state.call_token) {
            Some(input) if !input.trim().is_empty() => {
                Self::run_command(state, connection, author, input).await.map(Some)
            }
            Some(_) => Ok(None),
            None if OptionLabel::parse(content).is_some() => {
                // Strangers saying "B" in chat are not registered by it.
                let has_pending = users::query_user(connection, author.id)?
                    .is_some_and(|user| user.pending_question_id.is_some());
                if !has_pending {
                    return Ok(None);
                }

                let parameters = [content];
                let mut cmd = CommandInstance::load(state, connection, author, "answer", &parameters)?;
                if cmd.context.user().pending_question_id.is_none() {
                    return Ok(None);
                }
                cmd.answer().await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Runs `input`, a command with the call token already stripped.
    pub async fn run_command<M: LanguageModel>(
        state: &BotState<M>,
        connection: &mut Connection,
        author: Author<'_>,
        input: &str,
    ) -> Result<String> {
        // Split the input (on whitespace) into:
        // - The command (first token)
        // - Its parameters (all tokens afterwards)
        let split_tokens = input.split_whitespace().collect::<Vec<_>>();
        let Some((command, parameters)) = split_tokens.split_first() else {
            return Err(anyhow!("Empty command, see {}help for commands.", state.call_token));
        };
        let command = command.to_lowercase();

        if !Self::is_valid_cmd(&command) {
            log::info!("User submitted invalid command: {command}");
            return Err(anyhow!("Invalid command syntax."));
        }

        let mut cmd = CommandInstance::load(state, connection, author, &command, parameters)?;

        // Execute the command
        let result: String = match command.as_str() {
                  "help" => Self::get_help(state.call_token),
                  "lang" => cmd.lang()?,
               "subject" => cmd.subject()?,
                "topics" => cmd.topics(),
                 "topic" => cmd.topic()?,
            "practice" | "next" => cmd.next()?,
                "answer" => cmd.answer().await?,
                 "stats" => cmd.stats()?,
                "streak" => cmd.streak()?,
                   "top" => cmd.top()?,
                  "rank" => cmd.rank()?,
               "history" => cmd.history()?,
               "explain" => cmd.explain().await?,
                   "ask" => cmd.ask().await?,
            _ => {
                log::info!("User submitted unknown command: {command}");
                return Err(anyhow!(
                    "No such command found: {command}, see {}help for commands.",
                    state.call_token
                ));
            }
        };

        Ok(result)
    }
}

impl<'a, M: LanguageModel> CommandInstance<'a, M> {
    fn load(
        state: &'a BotState<M>,
        connection: &'a mut Connection,
        author: Author<'_>,
        command: &'a str,
        parameters: &'a [&'a str],
    ) -> Result<Self> {
        let context = PracticeContext::load(connection, author.id, author.name)?;
        Ok(Self { state, connection, context, command, parameters })
    }

    fn language(&self) -> Language {
        self.context.language()
    }

    fn usage(&self, arguments: &str) -> String {
        format!("Expected usage: `{}{} {arguments}`", self.state.call_token, self.command)
    }

    fn text_parameter(&self, arguments: &str) -> Result<String> {
        if self.parameters.is_empty() {
            return Err(anyhow!(self.usage(arguments)));
        }
        Ok(self.parameters.join(" "))
    }

    fn lang(&mut self) -> Result<String> {
        let language = self
            .parameters
            .first()
            .with_context(|| self.usage("<en|ru|kk>"))?
            .parse::<Language>()?;

        self.context.set_language(language);
        self.context.save(self.connection)?;
        log::info!("[lang] {} now practices in {language}", self.context.user().user_id);

        Ok(Phrase::LanguageSet.text(language).to_string())
    }

    fn subject(&mut self) -> Result<String> {
        let get_usage = || self.usage(&format!("<{}>", Subject::ALL.iter().join("|")));
        let subject = self.parameters.first().with_context(get_usage)?.parse::<Subject>()?;

        self.context.set_subject(subject);
        self.context.save(self.connection)?;

        Ok(format!("{} **{subject}**", Phrase::SubjectSet.text(self.language())))
    }

    fn topics(&self) -> String {
        let language = self.language();
        let topics = self.state.store.topics(self.context.subject());
        if topics.is_empty() {
            return Phrase::NoTopics.text(language).to_string();
        }

        let mut output = String::from(Phrase::TopicsTitle.text(language));
        for topic in topics {
            output += "\n\t";
            output += &topic;
        }
        output
    }

    fn topic(&mut self) -> Result<String> {
        let language = self.language();
        let topic = self.text_parameter("<topic|all>")?;

        if topic.eq_ignore_ascii_case("all") {
            self.context.set_topic(&self.state.store, None);
            self.context.save(self.connection)?;
            return Ok(Phrase::TopicCleared.text(language).to_string());
        }

        if !self.context.set_topic(&self.state.store, Some(&topic)) {
            return Ok(format!("{}\n\n{}", Phrase::UnknownTopic.text(language), self.topics()));
        }
        self.context.save(self.connection)?;

        Ok(format!("{} **{}**", Phrase::TopicSet.text(language), self.context.topic().unwrap_or(&topic)))
    }

    fn next(&mut self) -> Result<String> {
        let Some(question) = self.context.next_question(&self.state.store) else {
            return Ok(Phrase::NoQuestions.text(self.language()).to_string());
        };
        self.context.save(self.connection)?;

        Ok(format!("{question}\n`{}answer <A-E>`", self.state.call_token))
    }

    async fn answer(&mut self) -> Result<String> {
        let submitted = self.text_parameter("<A-E>")?;
        let today = self.state.streak_clock.today();

        let answered = self
            .context
            .answer(self.connection, &self.state.store, &self.state.tutor, today, &submitted)
            .await?;

        Ok(match answered {
            Some(answered) => format_answer(&answered, self.language()),
            None => Phrase::NoPendingQuestion.text(self.language()).to_string(),
        })
    }

    fn stats(&self) -> Result<String> {
        let language = self.language();
        let user_id = self.context.user().user_id;

        let Some(aggregate) = answers::aggregate_for(self.connection, user_id)? else {
            return Ok(Phrase::NoStats.text(language).to_string());
        };
        let by_subject = answers::aggregate_by_subject(self.connection, user_id)?;
        let streak = users::current_streak_of(self.connection, user_id)?;
        let rank = leaderboard::rank_of(self.connection, user_id)?;

        let mut output = format!("{}\n\n", Phrase::ProgressTitle.text(language));
        output += &format!("{}: {}\n", Phrase::TotalQuestions.text(language), aggregate.total);
        output += &format!("{}: {}\n", Phrase::CorrectAnswers.text(language), aggregate.correct);
        output += &format!(
            "{}: {}% {}\n",
            Phrase::Accuracy.text(language),
            aggregate.accuracy_percent,
            stars(aggregate.accuracy_percent)
        );

        for (subject, subject_aggregate) in &by_subject {
            output += &format!(
                "\n\t{subject}: {}/{} ({}%)",
                subject_aggregate.correct, subject_aggregate.total, subject_aggregate.accuracy_percent
            );
        }

        output += &format!(
            "\n\n🔥 {}: {} ({} {})",
            Phrase::Streak.text(language),
            streak.current,
            Phrase::BestStreak.text(language),
            streak.best
        );
        if let Some(rank) = rank {
            output += &format!("\n🏅 {}: #{rank}", Phrase::Rank.text(language));
        }

        Ok(output)
    }

    fn streak(&self) -> Result<String> {
        let language = self.language();
        let streak = users::current_streak_of(self.connection, self.context.user().user_id)?;

        Ok(format!(
            "🔥 {}: {} ({} {})",
            Phrase::Streak.text(language),
            streak.current,
            Phrase::BestStreak.text(language),
            streak.best
        ))
    }

    fn top(&self) -> Result<String> {
        let language = self.language();
        let n = self
            .parameters
            .first()
            .map(|n| n.parse::<usize>())
            .transpose()
            .with_context(|| self.usage("[count]"))?
            .unwrap_or(DEFAULT_TOP)
            .clamp(1, MAX_TOP);

        let standings = leaderboard::top(self.connection, n)?;
        if standings.is_empty() {
            return Ok(Phrase::EmptyLeaderboard.text(language).to_string());
        }

        let lines = standings
            .iter()
            .enumerate()
            .map(|(i, standing)| match i {
                0 => format!("🥇 {standing}"),
                1 => format!("🥈 {standing}"),
                2 => format!("🥉 {standing}"),
                _ => format!("{}. {standing}", i + 1),
            })
            .join("\n");

        Ok(format!("{}\n\n{lines}", Phrase::LeaderboardTitle.text(language)))
    }

    fn rank(&self) -> Result<String> {
        let language = self.language();
        Ok(match leaderboard::rank_of(self.connection, self.context.user().user_id)? {
            Some(rank) => format!("🏅 {}: #{rank}", Phrase::Rank.text(language)),
            None => Phrase::Unranked.text(language).to_string(),
        })
    }

    fn history(&self) -> Result<String> {
        let language = self.language();
        let events = answers::history(self.connection, self.context.user().user_id, HISTORY_LENGTH)?;
        if events.is_empty() {
            return Ok(Phrase::NoStats.text(language).to_string());
        }

        let lines = events
            .iter()
            .map(|event| {
                format!(
                    "{} {} #{}: {} ({}) · {}",
                    if event.is_correct { "✅" } else { "❌" },
                    event.subject,
                    event.question_id,
                    event.submitted,
                    event.correct,
                    event.answered_at.format("%Y-%m-%d %H:%M UTC"),
                )
            })
            .join("\n");

        Ok(format!("{}\n\n{lines}", Phrase::HistoryTitle.text(language)))
    }

    async fn explain(&mut self) -> Result<String> {
        let topic = self.text_parameter("<topic>")?;
        Ok(self
            .state
            .tutor
            .explain_topic(&topic, self.context.user().subject, self.language())
            .await)
    }

    async fn ask(&mut self) -> Result<String> {
        let question = self.text_parameter("<question>")?;
        Ok(self
            .state
            .tutor
            .answer_question(&question, self.context.user().subject, self.language())
            .await)
    }
}

fn format_answer(answered: &AnsweredQuestion, language: Language) -> String {
    let graded = &answered.graded;

    let mut output = if graded.event.is_correct {
        format!("🎉 **{}**\n\n", Phrase::Correct.text(language))
    } else {
        format!(
            "❌ **{}** ✅ {}) {}\n\n",
            Phrase::Incorrect.text(language),
            graded.event.correct,
            graded.correct_text()
        )
    };

    output += &format!("📖 {}\n\n", graded.question.explanation);
    output += &format!("🤖 **AI:**\n{}\n\n", answered.ai_explanation);

    output += &format!("🔥 {}: {}", Phrase::Streak.text(language), graded.streak.current);
    if let Some(aggregate) = graded.aggregate {
        output += &format!(
            " · {}: {}% ({}/{})",
            Phrase::Accuracy.text(language),
            aggregate.accuracy_percent,
            aggregate.correct,
            aggregate.total
        );
    }

    output += "\n\n";
    output += Phrase::ReadyMore.text(language);
    output
}

fn stars(accuracy_percent: f64) -> &'static str {
    match accuracy_percent {
        a if a >= 80.0 => "⭐⭐⭐⭐⭐",
        a if a >= 60.0 => "⭐⭐⭐⭐",
        a if a >= 40.0 => "⭐⭐⭐",
        _ => "⭐⭐",
    }
}

/// Non-async helpers
impl Commands {
    /// Ensures that the string slice conforms to C-like identifier regex
    fn is_valid_cmd(s: &str) -> bool {
        s.len() <= MAX_CMD_LENGTH && CMD_SYNTAX.is_match(s)
    }

    /// Gets a help string. Should be updated after a new command is added
    pub fn get_help(t: char) -> String {
        format!(
            r#"
**Command List:**
`{t}lang <en|ru|kk>`:  Choose your language.
`{t}subject <name>`:  Choose a subject (math, reading, history, physics, chemistry, biology, geography).
`{t}topics`:  List the topics of your subject.
`{t}topic <name|all>`:  Practice a single topic, or all of them.
`{t}practice` or `{t}next`:  Get a question.
`{t}answer <A-E>`:  Answer your question. A bare `A`..`E` works too.
`{t}stats`:  See your progress.
`{t}streak`:  See your daily streak.
`{t}top [count]`:  Show the leaderboard.
`{t}rank`:  Show your place on the leaderboard.
`{t}history`:  Show your latest answers.
`{t}explain <topic>`:  Get a topic explained.
`{t}ask <question>`:  Ask the tutor anything.
`{t}help`:  Get information on supported commands
"#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::QuestionStore;
    use crate::questions::tests::testdata;
    use crate::streak::StreakClock;
    use crate::untai::Tutor;
    use crate::untai::tests::Unreachable;
    use crate::untdb::testing;

    const ARU: Author<'static> = Author { id: 1, name: "Aru" };
    const DANA: Author<'static> = Author { id: 2, name: "Dana" };

    fn state() -> BotState<Unreachable> {
        BotState {
            store: QuestionStore::new(testdata()),
            tutor: Tutor::disabled(),
            call_token: '!',
            streak_clock: StreakClock::Utc,
        }
    }

    async fn say(state: &BotState<Unreachable>, connection: &mut Connection, author: Author<'_>, content: &str) -> String {
        Commands::respond(state, connection, author, content).await.unwrap().unwrap()
    }

    #[test]
    fn command_syntax() {
        assert!(Commands::is_valid_cmd("practice"));
        assert!(Commands::is_valid_cmd("top"));
        assert!(!Commands::is_valid_cmd("$$"));
        assert!(!Commands::is_valid_cmd("averyveryverylongcommand"));
        assert!(Commands::get_help('?').contains("`?answer <A-E>`"));
    }

    #[test]
    fn star_rating() {
        assert_eq!(stars(100.0), "⭐⭐⭐⭐⭐");
        assert_eq!(stars(66.7), "⭐⭐⭐⭐");
        assert_eq!(stars(40.0), "⭐⭐⭐");
        assert_eq!(stars(12.5), "⭐⭐");
    }

    #[tokio::test]
    async fn ignores_chatter() {
        let state = state();
        let mut connection = testing::database();

        for content in ["hello there", "!", "B"] {
            assert!(Commands::respond(&state, &mut connection, ARU, content).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn bare_labels_do_not_register_strangers() {
        let state = state();
        let mut connection = testing::database();

        assert!(Commands::respond(&state, &mut connection, ARU, "b").await.unwrap().is_none());
        assert!(users::query_user(&connection, ARU.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_commands() {
        let state = state();
        let mut connection = testing::database();

        let err = Commands::respond(&state, &mut connection, ARU, "!dance").await.unwrap_err();
        assert!(err.to_string().contains("No such command found: dance"));

        let err = Commands::respond(&state, &mut connection, ARU, "!$$").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid command syntax.");

        assert!(Commands::respond(&state, &mut connection, ARU, "!lang").await.is_err());
        assert!(Commands::respond(&state, &mut connection, ARU, "!subject astrology").await.is_err());
    }

    #[tokio::test]
    async fn practice_round() {
        let state = state();
        let mut connection = testing::database();

        assert_eq!(say(&state, &mut connection, ARU, "!lang ru").await, Phrase::LanguageSet.text(Language::Ru));
        say(&state, &mut connection, ARU, "!topic Algebra").await;

        let question = say(&state, &mut connection, ARU, "!next").await;
        assert!(question.contains("Найдите x: 2x + 3 = 11"));
        assert!(question.contains("B) 4"));

        let reply = say(&state, &mut connection, ARU, " b ").await;
        assert!(reply.contains(Phrase::Correct.text(Language::Ru)));
        assert!(reply.contains(Phrase::AiUnavailable.text(Language::Ru)));
        assert!(reply.contains("100% (1/1)"));

        // Nothing pending any more.
        assert!(Commands::respond(&state, &mut connection, ARU, "B").await.unwrap().is_none());
        assert_eq!(
            say(&state, &mut connection, ARU, "!answer B").await,
            Phrase::NoPendingQuestion.text(Language::Ru)
        );
    }

    #[tokio::test]
    async fn free_text_answers_count_as_wrong() {
        let state = state();
        let mut connection = testing::database();

        say(&state, &mut connection, ARU, "!topic geometry").await;
        say(&state, &mut connection, ARU, "!practice").await;
        let reply = say(&state, &mut connection, ARU, "!answer no idea").await;
        assert!(reply.contains("✅ C) 180°"));

        let history = say(&state, &mut connection, ARU, "!history").await;
        assert!(history.contains("❌ math #2: no idea (C)"));
    }

    #[tokio::test]
    async fn unknown_topic_lists_known_ones() {
        let state = state();
        let mut connection = testing::database();

        let reply = say(&state, &mut connection, ARU, "!topic calculus").await;
        assert!(reply.starts_with(Phrase::UnknownTopic.text(Language::En)));
        assert!(reply.contains("algebra"));
        assert_eq!(say(&state, &mut connection, ARU, "!topic all").await, Phrase::TopicCleared.text(Language::En));
    }

    #[tokio::test]
    async fn subject_without_questions() {
        let state = state();
        let mut connection = testing::database();

        say(&state, &mut connection, ARU, "!subject chemistry").await;
        assert_eq!(say(&state, &mut connection, ARU, "!next").await, Phrase::NoQuestions.text(Language::En));
        assert_eq!(say(&state, &mut connection, ARU, "!topics").await, Phrase::NoTopics.text(Language::En));
    }

    #[tokio::test]
    async fn stats_and_leaderboard() {
        let state = state();
        let mut connection = testing::database();

        assert_eq!(say(&state, &mut connection, ARU, "!stats").await, Phrase::NoStats.text(Language::En));
        assert_eq!(say(&state, &mut connection, ARU, "!rank").await, Phrase::Unranked.text(Language::En));
        assert_eq!(say(&state, &mut connection, ARU, "!top").await, Phrase::EmptyLeaderboard.text(Language::En));

        for (author, answer) in [(ARU, "B"), (DANA, "C")] {
            say(&state, &mut connection, author, "!topic algebra").await;
            say(&state, &mut connection, author, "!next").await;
            say(&state, &mut connection, author, answer).await;
        }

        let stats = say(&state, &mut connection, ARU, "!stats").await;
        assert!(stats.contains("Accuracy: 100% ⭐⭐⭐⭐⭐"));
        assert!(stats.contains("math: 1/1 (100%)"));
        assert!(stats.contains("Streak: 1 (best 1)"));
        assert!(stats.contains("Rank: #1"));

        let top = say(&state, &mut connection, DANA, "!top 5").await;
        assert!(top.contains("🥇 **Aru**: 1/1 (100%)"));
        assert!(top.contains("🥈 **Dana**: 0/1 (0%)"));
        assert!(Commands::respond(&state, &mut connection, DANA, "!top many").await.is_err());
        assert_eq!(say(&state, &mut connection, DANA, "!rank").await, "🏅 Rank: #2");
    }

    #[tokio::test]
    async fn tutor_commands_fall_back_to_placeholder() {
        let state = state();
        let mut connection = testing::database();

        assert_eq!(
            say(&state, &mut connection, ARU, "!explain photosynthesis").await,
            Phrase::AiUnavailable.text(Language::En)
        );
        assert_eq!(
            say(&state, &mut connection, ARU, "!ask why is the sky blue").await,
            Phrase::AiUnavailable.text(Language::En)
        );
        assert!(Commands::respond(&state, &mut connection, ARU, "!ask").await.is_err());
    }
}
