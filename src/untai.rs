//! Explanations from a generative language model.
//!
//! The model is an unreliable collaborator: every call either yields its text
//! or a neutral placeholder in the student's language. Failures are logged
//! here and never reach the caller.

pub mod gemini;

use std::future::Future;

use anyhow::Result;

use crate::locale::Phrase;
use crate::models::{Language, Subject};

/// Anything that turns a prompt into text.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

pub struct Tutor<M> {
    model: Option<M>,
}

impl<M: LanguageModel> Tutor<M> {
    pub fn new(model: M) -> Self {
        Self { model: Some(model) }
    }

    /// A tutor without a model; every answer is the placeholder.
    pub fn disabled() -> Self {
        Self { model: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    async fn ask(&self, prompt: String, language: Language) -> String {
        let placeholder = Phrase::AiUnavailable.text(language).to_string();
        let Some(model) = &self.model else {
            return placeholder;
        };

        match model.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                log::warn!("[Tutor::ask] Model returned an empty response.");
                placeholder
            }
            Err(err) => {
                log::error!("[Tutor::ask] Model call failed: {err:#}");
                placeholder
            }
        }
    }

    /// Praises a correct answer or explains why the submitted one is wrong.
    ///
    /// `is_correct` is the verdict already recorded for the answer.
    pub async fn explain_answer(
        &self,
        question_text: &str,
        correct_option_text: &str,
        submitted_option_text: &str,
        is_correct: bool,
        language: Language,
    ) -> String {
        let language_name = language.english_name();

        let prompt = if is_correct {
            format!(
                "A student answered correctly!\n\n\
                 Question: {question_text}\n\
                 Correct answer: {correct_option_text}\n\n\
                 In {language_name}, write 2-3 encouraging sentences praising them.\n\n\
                 Your response:"
            )
        } else {
            format!(
                "Help a student understand their mistake.\n\n\
                 Question: {question_text}\n\
                 Correct answer: {correct_option_text}\n\
                 Student's answer: {submitted_option_text}\n\n\
                 In {language_name}:\n\
                 - Explain why the correct answer is right\n\
                 - Be kind and encouraging\n\
                 - Keep under 150 words\n\n\
                 Your explanation:"
            )
        };

        self.ask(prompt, language).await
    }

    /// Explains a topic of `subject` for a high school student.
    pub async fn explain_topic(&self, topic: &str, subject: Option<Subject>, language: Language) -> String {
        let subject = subject.map_or("general studies", Subject::code);
        let prompt = format!(
            "You are a helpful UNT (Unified National Testing) exam tutor for Kazakhstan students.\n\n\
             Explain the topic: \"{topic}\" in {subject}\n\n\
             Requirements:\n\
             - Use {} language\n\
             - Make it simple and clear for high school students\n\
             - Include practical examples\n\
             - Keep under 300 words\n\
             - Be encouraging and supportive\n\n\
             Start your explanation:",
            language.english_name()
        );

        self.ask(prompt, language).await
    }

    /// Answers a free-form question from a student.
    pub async fn answer_question(&self, question: &str, subject: Option<Subject>, language: Language) -> String {
        let subject = subject.map_or("general studies", Subject::code);
        let prompt = format!(
            "You are a UNT exam preparation assistant.\n\n\
             Student's question: {question}\n\
             Subject: {subject}\n\n\
             Requirements:\n\
             - Answer in {}\n\
             - Be clear, accurate, and helpful\n\
             - Include examples if needed\n\
             - Keep under 300 words\n\
             - Be encouraging\n\n\
             Your answer:",
            language.english_name()
        );

        self.ask(prompt, language).await
    }
}

#[cfg(test)]
impl<M> Tutor<M> {
    pub(crate) fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }
}
