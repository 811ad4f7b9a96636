use std::collections::BTreeMap;

use crate::models::{Language, OptionLabel, Subject};
use crate::questions::record::QuestionRecord;

/// A question resolved into one language, ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuestion {
    pub subject: Subject,
    pub id: i64,
    pub topic: String,
    pub language: Language,

    pub text: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct: OptionLabel,
    pub explanation: String,
}

impl QuestionRecord {
    /// Resolves every localized field for `language`, falling back to English.
    pub fn render(&self, subject: Subject, language: Language) -> RenderedQuestion {
        RenderedQuestion {
            subject,
            id: self.id,
            topic: self.topic.clone(),
            language,
            text: self.question.get(language).to_string(),
            options: self.options.clone(),
            correct: self.correct,
            explanation: self.explanation.get(language).to_string(),
        }
    }
}

impl RenderedQuestion {
    /// Text of option `label`; labels outside the option set are echoed back as-is.
    pub fn option_text(&self, label: &str) -> String {
        OptionLabel::parse(label)
            .and_then(|label| self.options.get(&label))
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

impl std::fmt::Display for RenderedQuestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "❓ **{}** · *{}*\n", self.subject, self.topic)?;
        writeln!(f, "{}\n", self.text)?;
        for (label, text) in &self.options {
            writeln!(f, "{label}) {text}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::record::LocalizedText;

    fn record() -> QuestionRecord {
        QuestionRecord {
            id: 8,
            topic: "optics".into(),
            question: LocalizedText {
                en: "What bends light?".into(),
                ru: "Что преломляет свет?".into(),
                kk: "".into(),
            },
            options: OptionLabel::ALL
                .into_iter()
                .zip(["Lens", "Mirror", "Prism", "Water", "Air"])
                .map(|(label, text)| (label, text.to_string()))
                .collect(),
            correct: OptionLabel::A,
            explanation: LocalizedText {
                en: "A lens refracts light.".into(),
                ru: "Линза преломляет свет.".into(),
                kk: "Линза жарықты сындырады.".into(),
            },
        }
    }

    #[test]
    fn renders_requested_language() {
        let rendered = record().render(Subject::Physics, Language::Ru);
        assert_eq!(rendered.text, "Что преломляет свет?");
        assert_eq!(rendered.explanation, "Линза преломляет свет.");
        assert_eq!(rendered.language, Language::Ru);
    }

    #[test]
    fn missing_variant_falls_back_to_english() {
        let rendered = record().render(Subject::Physics, Language::Kk);
        assert_eq!(rendered.text, "What bends light?");
        assert_eq!(rendered.explanation, "Линза жарықты сындырады.");
    }

    #[test]
    fn lists_options_in_label_order() {
        let shown = record().render(Subject::Physics, Language::En).to_string();
        let lens = shown.find("A) Lens").unwrap();
        let air = shown.find("E) Air").unwrap();
        assert!(lens < air);
        assert!(shown.contains("What bends light?"));
    }

    #[test]
    fn option_text_echoes_unknown_labels() {
        let rendered = record().render(Subject::Physics, Language::En);
        assert_eq!(rendered.option_text("b"), "Mirror");
        assert_eq!(rendered.option_text("maybe"), "maybe");
    }
}
