use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const DEFAULT_SCORE: f64 = 0.5;

const GENERIC_FEEDBACK: &str = "The answer could be improved for clarity and relevance.";
const FALLBACK_FEEDBACK: &str =
    "Your answer was evaluated, but we couldn't generate detailed feedback.";

/// Appended in order when filtering leaves fewer than three suggestions.
pub(crate) const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "Focus on addressing the main points of the question",
    "Add more specific details and examples",
    "Improve the overall structure of your answer",
];

const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Address the key points in the question",
    "Provide specific examples to support your answer",
    "Structure your response with clear organization",
];

// Markup delimiters plus the CJK characters the upstream model leaks when it
// ignores the English-only instruction.
const DENIED_CHARS: [char; 10] = ['<', '>', '，', '。', '《', '》', '学', '生', '请', '你'];

// Meta-instructions and UI directives that must never reach a student.
const DENIED_PHRASES: [&str; 4] = ["script", "refresh", "student", "click"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Evaluation {
    pub(crate) score: f64,
    pub(crate) feedback: String,
    pub(crate) suggestions: Vec<String>,
}

/// Which response shape the raw text matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EvaluationSource {
    /// A JSON object with score/feedback/suggestions was found.
    Structured,
    /// No JSON, but the short numbered-list response shape matched.
    Suggestions,
    /// Nothing usable; the canned default evaluation was substituted.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedEvaluation {
    pub(crate) evaluation: Evaluation,
    pub(crate) source: EvaluationSource,
}

pub(crate) struct SuggestionRule {
    pub(crate) name: &'static str,
    keeps: fn(&str) -> bool,
}

/// Ordered filter pipeline; a suggestion is dropped on the first failing rule.
/// The same rules apply to fresh AI output and to suggestions re-read from
/// storage, so the two call sites can never diverge.
pub(crate) const SUGGESTION_RULES: &[SuggestionRule] = &[
    SuggestionRule { name: "non_empty", keeps: is_non_empty },
    SuggestionRule { name: "no_denied_chars", keeps: has_no_denied_chars },
    SuggestionRule { name: "no_denied_phrases", keeps: has_no_denied_phrases },
];

fn is_non_empty(text: &str) -> bool {
    !text.trim().is_empty()
}

fn has_no_denied_chars(text: &str) -> bool {
    !text.chars().any(|ch| DENIED_CHARS.contains(&ch))
}

fn has_no_denied_phrases(text: &str) -> bool {
    let lowered = text.to_lowercase();
    !DENIED_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

pub(crate) fn suggestion_passes(text: &str) -> bool {
    SUGGESTION_RULES.iter().all(|rule| (rule.keeps)(text))
}

/// Coerce a raw AI response into the guaranteed shape: score in [0, 1],
/// non-empty feedback, exactly three non-empty suggestions.
pub(crate) fn normalize(raw: &str) -> NormalizedEvaluation {
    if let Some(object) = extract_json_object(raw) {
        let score = coerce_score(object.get("score"));
        let feedback = coerce_feedback(object.get("feedback"));
        let suggestions = match object.get("suggestions").and_then(Value::as_array) {
            Some(items) => pad_suggestions(filter_suggestion_values(items)),
            None => DEFAULT_SUGGESTIONS.iter().map(ToString::to_string).collect(),
        };

        return NormalizedEvaluation {
            evaluation: Evaluation { score, feedback, suggestions },
            source: EvaluationSource::Structured,
        };
    }

    let numbered = parse_numbered_lines(raw);
    if !numbered.is_empty() {
        return NormalizedEvaluation {
            evaluation: Evaluation {
                score: DEFAULT_SCORE,
                feedback: FALLBACK_FEEDBACK.to_string(),
                suggestions: pad_suggestions(numbered),
            },
            source: EvaluationSource::Suggestions,
        };
    }

    NormalizedEvaluation { evaluation: fallback_evaluation(), source: EvaluationSource::Fallback }
}

pub(crate) fn fallback_evaluation() -> Evaluation {
    Evaluation {
        score: DEFAULT_SCORE,
        feedback: FALLBACK_FEEDBACK.to_string(),
        suggestions: FALLBACK_SUGGESTIONS.iter().map(ToString::to_string).collect(),
    }
}

/// Filter a deserialized suggestions payload re-read from storage. Unlike the
/// normalizer this never pads: stored rows come back with at most three
/// surviving entries, and malformed payloads become an empty list.
pub(crate) fn filter_stored_suggestions(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut filtered = filter_suggestion_values(items);
    filtered.truncate(3);
    filtered
}

fn filter_suggestion_values(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|text| suggestion_passes(text))
        .map(ToString::to_string)
        .collect()
}

fn pad_suggestions(mut suggestions: Vec<String>) -> Vec<String> {
    suggestions.truncate(3);
    for default in DEFAULT_SUGGESTIONS {
        if suggestions.len() >= 3 {
            break;
        }
        if suggestions.iter().any(|existing| existing == default) {
            continue;
        }
        suggestions.push(default.to_string());
    }
    suggestions
}

/// Parse the short response shape: suggestions one per line, prefixed
/// "1. ", "2) " or similar. Arbitrary prose must not match, so the shape is
/// recognized only when at least two lines carry a numeric prefix; the
/// remaining unprefixed non-empty lines then count too.
fn parse_numbered_lines(raw: &str) -> Vec<String> {
    let lines: Vec<&str> =
        raw.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

    let prefixed = lines.iter().filter(|line| has_list_prefix(line)).count();
    if prefixed < 2 {
        return Vec::new();
    }

    lines
        .into_iter()
        .map(strip_list_prefix)
        .map(str::trim)
        .filter(|text| suggestion_passes(text))
        .map(ToString::to_string)
        .collect()
}

fn has_list_prefix(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(first), Some(second)) if first.is_ascii_digit() && matches!(second, '.' | ')' | ' ')
    )
}

fn strip_list_prefix(line: &str) -> &str {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second))
            if first.is_ascii_digit() && matches!(second, '.' | ')' | ' ') =>
        {
            &line[2..]
        }
        _ => line,
    }
}

/// Locate a JSON object in the raw response, tolerating code fences and
/// surrounding prose.
fn extract_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let candidate = fenced_block(trimmed).unwrap_or(trimmed);

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&candidate[start..=end]).ok().filter(|value| value.is_object())
}

fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw
        .find("```json")
        .map(|idx| idx + "```json".len())
        .or_else(|| raw.find("```").map(|idx| idx + 3))?;
    let rest = &raw[start..];
    let end = rest.rfind("```")?;
    if end == 0 {
        return None;
    }
    Some(rest[..end].trim())
}

fn coerce_score(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).map(|score| score.clamp(0.0, 1.0)).unwrap_or(DEFAULT_SCORE)
}

fn coerce_feedback(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| GENERIC_FEEDBACK.to_string())
}
