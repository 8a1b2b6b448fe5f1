//! Accuracy and model-name extraction from free-form experiment text.
//!
//! Both extractors run an ordered list of rules against the text. Each rule is
//! a case-insensitive pattern plus a handler that turns the captures into a
//! value; the first rule whose pattern matches anywhere in the text decides
//! the result and later rules are not consulted.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A single prioritized extraction rule.
struct Rule<T> {
    name: &'static str,
    pattern: Regex,
    handler: fn(&Captures<'_>) -> Option<T>,
}

impl<T> Rule<T> {
    fn new(name: &'static str, pattern: &str, handler: fn(&Captures<'_>) -> Option<T>) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("extraction rule pattern must compile"),
            handler,
        }
    }
}

/// Apply `rules` in order; the first pattern that matches decides the result.
fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<T> {
    let (rule, caps) = rules
        .iter()
        .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule, caps)))?;
    tracing::trace!(rule = rule.name, matched = &caps[0], "Extraction rule matched");
    (rule.handler)(&caps)
}

static ACCURACY_RULES: LazyLock<Vec<Rule<f64>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "labelled_value",
            r"(?i)(?:accuracy|acc|precision|f1|score)\s*[:=]\s*([0-9]+(?:[.,][0-9]+)?)\s*%?",
            parse_accuracy,
        ),
        Rule::new(
            "percent_then_label",
            r"(?i)([0-9]+(?:[.,][0-9]+)?)\s*%\s*(?:accuracy|acc|precision|f1|score)",
            parse_accuracy,
        ),
    ]
});

static MODEL_RULES: LazyLock<Vec<Rule<String>>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "model_key",
            r"(?i)(?:model|model_name)\s*[:=]\s*([A-Za-z0-9._\-/]+)",
            capture_verbatim,
        ),
        Rule::new("llama", r"(?i)\b(llama[0-9.\-a-zA-Z]*)\b", capture_verbatim),
        Rule::new("mistral", r"(?i)\b(mistral[0-9.\-a-zA-Z]*)\b", capture_verbatim),
    ]
});

fn parse_accuracy(caps: &Captures<'_>) -> Option<f64> {
    let raw = caps.get(1)?.as_str().replace(',', ".");
    raw.parse::<f64>().ok().map(normalize_accuracy)
}

fn capture_verbatim(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Bring an accuracy onto the decimal `[0, 1]` scale.
///
/// Values above `1` are read as percentages and divided by 100; everything
/// else, including `1.0` itself and out-of-range negatives, passes through.
pub fn normalize_accuracy(value: f64) -> f64 {
    if value > 1.0 { value / 100.0 } else { value }
}

/// Parse an accuracy metric such as `accuracy: 92.1`, `acc=0,87`, or
/// `91% f1` out of free-form text.
///
/// Returns the normalized decimal, or `None` when the text is absent, empty,
/// or carries no recognizable metric.
pub fn extract_accuracy(text: Option<&str>) -> Option<f64> {
    let text = text.filter(|t| !t.is_empty())?;
    first_match(&ACCURACY_RULES, text)
}

/// Infer a model identifier from an experiment's name and description.
///
/// Looks for an explicit `model=<id>` key, then bare `llama*` and `mistral*`
/// tokens, returning the matched text with its original casing. When nothing
/// matches, the raw `name` is returned as-is.
pub fn extract_model_name(name: Option<&str>, description: Option<&str>) -> Option<String> {
    let text = [name, description]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }

    first_match(&MODEL_RULES, &text).or_else(|| name.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected an accuracy");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_normalize_percentage() {
        assert!((normalize_accuracy(90.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_decimal_unchanged() {
        assert_eq!(normalize_accuracy(0.9), 0.9);
        assert_eq!(normalize_accuracy(0.0), 0.0);
    }

    #[test]
    fn test_normalize_boundary_one_is_not_percentage() {
        assert_eq!(normalize_accuracy(1.0), 1.0);
    }

    #[test]
    fn test_normalize_does_not_validate() {
        assert_eq!(normalize_accuracy(-5.0), -5.0);
        assert!((normalize_accuracy(250.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_twice_only_stable_up_to_hundred() {
        assert_eq!(normalize_accuracy(normalize_accuracy(92.0)), normalize_accuracy(92.0));
        assert_eq!(normalize_accuracy(normalize_accuracy(100.0)), 1.0);
        // Above 100 a second pass divides again.
        assert!((normalize_accuracy(normalize_accuracy(250.0)) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_extract_labelled_value() {
        approx(extract_accuracy(Some("accuracy: 92.1")), 0.921);
        approx(extract_accuracy(Some("ACC = 0.91")), 0.91);
        approx(extract_accuracy(Some("precision=88%")), 0.88);
        approx(extract_accuracy(Some("bert-base score:75")), 0.75);
    }

    #[test]
    fn test_extract_percent_then_label() {
        approx(extract_accuracy(Some("91% f1")), 0.91);
        approx(extract_accuracy(Some("reached 93.5 % Accuracy")), 0.935);
    }

    #[test]
    fn test_extract_comma_decimal() {
        approx(extract_accuracy(Some("acc=0,87")), 0.87);
        approx(extract_accuracy(Some("88,5% accuracy")), 0.885);
    }

    #[test]
    fn test_extract_no_metric() {
        assert_eq!(extract_accuracy(Some("no metric here")), None);
        assert_eq!(extract_accuracy(Some("accuracy unknown")), None);
    }

    #[test]
    fn test_extract_ascii_digits_only() {
        // Arabic-Indic digits are not read as a value.
        assert_eq!(extract_accuracy(Some("accuracy: \u{0669}\u{0662}")), None);
        assert_eq!(extract_accuracy(Some("\u{0669}\u{0662}% accuracy")), None);
        approx(extract_accuracy(Some("accuracy: 92")), 0.92);
    }

    #[test]
    fn test_extract_empty_or_absent() {
        assert_eq!(extract_accuracy(None), None);
        assert_eq!(extract_accuracy(Some("")), None);
    }

    #[test]
    fn test_labelled_rule_takes_priority() {
        // The percent-then-label form appears first in the text, but the
        // labelled form is the higher-priority rule.
        approx(extract_accuracy(Some("80% f1, accuracy=95")), 0.95);
    }

    #[test]
    fn test_model_explicit_key() {
        assert_eq!(
            extract_model_name(Some("exp1"), Some("model=llama3-8b")),
            Some("llama3-8b".to_string())
        );
        assert_eq!(
            extract_model_name(Some("exp"), Some("Model_Name: org/Phi-3.5_mini")),
            Some("org/Phi-3.5_mini".to_string())
        );
    }

    #[test]
    fn test_model_bare_tokens_keep_case() {
        assert_eq!(
            extract_model_name(Some("mistral-7b-run"), None),
            Some("mistral-7b-run".to_string())
        );
        assert_eq!(
            extract_model_name(Some("finetune"), Some("base Llama-2-13B weights")),
            Some("Llama-2-13B".to_string())
        );
    }

    #[test]
    fn test_model_key_beats_bare_token() {
        assert_eq!(
            extract_model_name(Some("llama-baseline"), Some("model=gpt2")),
            Some("gpt2".to_string())
        );
    }

    #[test]
    fn test_model_llama_beats_mistral() {
        assert_eq!(
            extract_model_name(Some("mistral-7b vs llama2"), None),
            Some("llama2".to_string())
        );
    }

    #[test]
    fn test_model_fallback_to_name() {
        assert_eq!(
            extract_model_name(Some("my-exp"), Some("no model mentioned")),
            Some("my-exp".to_string())
        );
    }

    #[test]
    fn test_model_fallback_without_name() {
        assert_eq!(extract_model_name(None, Some("just a note")), None);
    }

    #[test]
    fn test_model_both_absent() {
        assert_eq!(extract_model_name(None, None), None);
        assert_eq!(extract_model_name(Some(""), Some("")), None);
    }
}
