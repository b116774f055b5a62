//! Scripted intake assistant.
//!
//! The dialogue is a fixed three-step script driven by keyword matching, not
//! a language model. All logic here is pure: the HTTP adapter feeds the
//! previous [`DialogueState`] plus the resident's message and gets back the
//! reply, the next state, and (once complete) a [`RequestSummary`] to
//! prefill the submission form.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::request::{Category, Priority};

/// Opening line shown before the resident types anything.
pub const GREETING: &str = "Здравствуйте! Я AI-помощник Домовой. Опишите, пожалуйста, \
     вашу проблему, и я помогу создать заявку.";

const ASK_APARTMENT: &str = "Спасибо за уточнение. Укажите, пожалуйста, номер вашей квартиры.";
const CLOSING: &str =
    "Отлично! Я собрал всю необходимую информацию. Сейчас подготовлю заявку для вас.";
const FALLBACK: &str = "Спасибо!";

/// Ordered keyword table: first matching group wins.
///
/// The leak group keys on the stem "теч" so inflected forms ("течет",
/// "течь") match alike.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Leak, &["теч", "протечка", "вода"]),
    (Category::Elevator, &["лифт"]),
    (Category::Heating, &["отопление", "батарея", "холодно"]),
    (Category::Electrical, &["свет", "электр", "розетка"]),
    (Category::Plumbing, &["сантехник", "раковина", "унитаз"]),
];

/// Classify a free-text problem description by keyword, case-insensitively.
/// Unmatched text falls back to [`Category::Other`].
pub fn classify(text: &str) -> Category {
    let lowered = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return *category;
        }
    }
    Category::Other
}

/// Decide urgency from the category and the original description.
///
/// A trapped-person mention ("застрял") escalates any category to urgent.
pub fn assess_priority(category: Category, description: &str) -> Priority {
    let lowered = description.to_lowercase();
    if category == Category::Elevator || lowered.contains("застрял") {
        return Priority::Urgent;
    }
    match category {
        Category::Leak | Category::Heating => Priority::High,
        Category::Electrical => Priority::Medium,
        _ => Priority::Low,
    }
}

fn follow_up(category: Category) -> &'static str {
    match category {
        Category::Leak => {
            "Понимаю, это серьезная ситуация с протечкой. Скажите, пожалуйста, \
             насколько интенсивная протечка? Это капли или сильный поток?"
        }
        Category::Elevator => {
            "Понял, проблема с лифтом. Есть ли кто-то внутри лифта? Это критически важно."
        }
        Category::Heating => {
            "Понимаю вашу проблему с отоплением. Батареи совсем холодные или чуть \
             теплые? Это во всех комнатах?"
        }
        Category::Electrical => {
            "Понял, проблема с электричеством. Вы проверили, не выбило ли автомат \
             в электрощитке?"
        }
        Category::Plumbing => "Понимаю. Вода совсем не уходит или уходит медленно?",
        Category::Other => "Спасибо за описание. Можете уточнить, когда началась проблема?",
    }
}

static DIGITS_RE: OnceLock<Regex> = OnceLock::new();

fn extract_apartment(text: &str) -> Option<String> {
    let re = DIGITS_RE.get_or_init(|| {
        Regex::new(r"\d+").unwrap_or_else(|error| panic!("digit regex failed to compile: {error}"))
    });
    re.find(text).map(|m| m.as_str().to_owned())
}

/// Which turn the dialogue expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStep {
    /// Waiting for the initial problem description.
    #[default]
    Problem,
    /// Waiting for the answer to the category follow-up question.
    Clarification,
    /// Waiting for the apartment number.
    Apartment,
    /// Script finished; further messages only earn a thank-you.
    Complete,
}

/// Dialogue position plus the slots filled so far.
///
/// Serialized to the client verbatim and sent back with the next message, so
/// the server keeps no per-dialogue state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    pub step: DialogueStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
}

/// Prefill data produced when the script completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub category: Category,
    pub description: String,
    /// Digit run extracted from the apartment answer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub priority: Priority,
}

/// Result of one dialogue turn.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Assistant reply to show the resident.
    pub reply: &'static str,
    /// State to echo back with the next message.
    pub state: DialogueState,
    /// Present exactly when the script has just completed.
    pub summary: Option<RequestSummary>,
}

/// Advance the dialogue by one resident message.
pub fn advance(state: DialogueState, message: &str) -> StepOutcome {
    match state.step {
        DialogueStep::Problem => {
            let category = classify(message);
            StepOutcome {
                reply: follow_up(category),
                state: DialogueState {
                    step: DialogueStep::Clarification,
                    category: Some(category),
                    description: Some(message.to_owned()),
                    apartment: None,
                },
                summary: None,
            }
        }
        DialogueStep::Clarification => StepOutcome {
            reply: ASK_APARTMENT,
            state: DialogueState {
                step: DialogueStep::Apartment,
                ..state
            },
            summary: None,
        },
        DialogueStep::Apartment => {
            let apartment = extract_apartment(message);
            let category = state.category.unwrap_or(Category::Other);
            let description = state.description.clone().unwrap_or_default();
            let priority = assess_priority(category, &description);
            let summary = RequestSummary {
                category,
                description,
                apartment: apartment.clone(),
                priority,
            };
            StepOutcome {
                reply: CLOSING,
                state: DialogueState {
                    step: DialogueStep::Complete,
                    apartment,
                    ..state
                },
                summary: Some(summary),
            }
        }
        DialogueStep::Complete => StepOutcome {
            reply: FALLBACK,
            state,
            summary: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("У меня течет с потолка", Category::Leak)]
    #[case("Обнаружена ПРОТЕЧКА в ванной", Category::Leak)]
    #[case("Лифт не работает", Category::Elevator)]
    #[case("Батарея холодная", Category::Heating)]
    #[case("Не работает розетка", Category::Electrical)]
    #[case("Засорилась раковина", Category::Plumbing)]
    #[case("Скрипит дверь в подъезде", Category::Other)]
    fn keyword_classification(#[case] text: &str, #[case] expected: Category) {
        assert_eq!(classify(text), expected);
    }

    #[rstest]
    fn first_matching_group_wins() {
        // "вода" (leak group) appears before "раковина" would be considered.
        assert_eq!(classify("вода из раковины"), Category::Leak);
    }

    #[rstest]
    #[case(Category::Elevator, "лифт стоит", Priority::Urgent)]
    #[case(Category::Other, "человек застрял между этажами", Priority::Urgent)]
    #[case(Category::Leak, "капает", Priority::High)]
    #[case(Category::Heating, "холодно", Priority::High)]
    #[case(Category::Electrical, "искрит", Priority::Medium)]
    #[case(Category::Plumbing, "засор", Priority::Low)]
    #[case(Category::Other, "шум", Priority::Low)]
    fn priority_table(
        #[case] category: Category,
        #[case] description: &str,
        #[case] expected: Priority,
    ) {
        assert_eq!(assess_priority(category, description), expected);
    }

    #[rstest]
    fn full_script_produces_leak_summary() {
        let first = advance(DialogueState::default(), "Течет с потолка в ванной");
        assert_eq!(first.state.step, DialogueStep::Clarification);
        assert_eq!(first.state.category, Some(Category::Leak));
        assert!(first.summary.is_none());

        let second = advance(first.state, "Сильный поток");
        assert_eq!(second.state.step, DialogueStep::Apartment);
        assert_eq!(second.reply, ASK_APARTMENT);
        assert!(second.summary.is_none());

        let third = advance(second.state, "Квартира 42, пятый этаж");
        assert_eq!(third.state.step, DialogueStep::Complete);
        assert_eq!(third.reply, CLOSING);
        let summary = third.summary.expect("script completed");
        assert_eq!(summary.category, Category::Leak);
        assert_eq!(summary.priority, Priority::High);
        assert_eq!(summary.apartment.as_deref(), Some("42"));
        assert_eq!(summary.description, "Течет с потолка в ванной");
    }

    #[rstest]
    fn missing_apartment_digits_leave_slot_empty() {
        let state = DialogueState {
            step: DialogueStep::Apartment,
            category: Some(Category::Other),
            description: Some("шум".into()),
            apartment: None,
        };
        let outcome = advance(state, "не помню номер");
        assert!(outcome.state.apartment.is_none());
        let summary = outcome.summary.expect("completed");
        assert!(summary.apartment.is_none());
    }

    #[rstest]
    fn completed_dialogue_only_thanks() {
        let state = DialogueState {
            step: DialogueStep::Complete,
            ..DialogueState::default()
        };
        let outcome = advance(state.clone(), "еще вопрос");
        assert_eq!(outcome.reply, FALLBACK);
        assert_eq!(outcome.state, state);
        assert!(outcome.summary.is_none());
    }

    #[rstest]
    fn greeting_introduces_the_assistant() {
        assert!(GREETING.starts_with("Здравствуйте! Я AI-помощник Домовой."));
    }

    #[rstest]
    fn advance_is_deterministic() {
        let a = advance(DialogueState::default(), "лифт застрял");
        let b = advance(DialogueState::default(), "лифт застрял");
        assert_eq!(a.state, b.state);
        assert_eq!(a.reply, b.reply);
    }
}
