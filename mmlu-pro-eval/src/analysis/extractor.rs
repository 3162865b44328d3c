//! Answer extraction from free-form model output
//!
//! Tiers are tried in a fixed order and the first hit wins:
//!
//! 1. `answer is (X)` / `answer is X`
//! 2. `Answer: X` (case-insensitive `a`), last occurrence on the first line that has one
//! 3. the last standalone letter `A`-`J` anywhere in the text
//!
//! Letters are always restricted to `A`-`J`.

use regex::Regex;
use std::sync::OnceLock;

/// Which rule produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    AnswerIs,
    AnswerColon,
    LastLetter,
}

fn answer_is_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"answer is \(?([A-J])\)?").expect("valid regex"))
}

fn answer_colon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".*[aA]nswer:\s*([A-J])").expect("valid regex"))
}

fn standalone_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-J]\b").expect("valid regex"))
}

/// Extract the predicted choice letter, or `None` when nothing matches
pub fn extract_answer(text: &str) -> Option<String> {
    extract_answer_with_tier(text).map(|(letter, _)| letter)
}

/// Extract the predicted letter together with the tier that matched
pub fn extract_answer_with_tier(text: &str) -> Option<(String, ExtractionTier)> {
    if let Some(caps) = answer_is_re().captures(text) {
        return Some((caps[1].to_string(), ExtractionTier::AnswerIs));
    }

    if let Some(caps) = answer_colon_re().captures(text) {
        return Some((caps[1].to_string(), ExtractionTier::AnswerColon));
    }

    standalone_letter_re()
        .find_iter(text)
        .last()
        .map(|m| (m.as_str().to_string(), ExtractionTier::LastLetter))
}

/// Remove markdown bold markers that models wrap around the answer
pub fn normalize_output(text: &str) -> String {
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_is_parenthesized() {
        let text = "Let me work through it... The answer is (C).";
        assert_eq!(extract_answer(text).as_deref(), Some("C"));
    }

    #[test]
    fn test_answer_is_bare_letter() {
        let (letter, tier) = extract_answer_with_tier("so the answer is H").unwrap();
        assert_eq!(letter, "H");
        assert_eq!(tier, ExtractionTier::AnswerIs);
    }

    #[test]
    fn test_answer_is_is_case_sensitive_on_letter() {
        // lowercase letter does not satisfy tier 1; no other tier matches either
        assert_eq!(extract_answer("the answer is (c)"), None);
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(extract_answer("no idea, sorry"), None);
        assert_eq!(extract_answer(""), None);
    }

    #[test]
    fn test_pronoun_i_is_a_standalone_letter() {
        let (letter, tier) = extract_answer_with_tier("I am not sure about this one.").unwrap();
        assert_eq!(letter, "I");
        assert_eq!(tier, ExtractionTier::LastLetter);
    }

    #[test]
    fn test_answer_colon_beats_stray_letter() {
        let text = "Answer: B\nOn reflection, option D looks tempting too.";
        let (letter, tier) = extract_answer_with_tier(text).unwrap();
        assert_eq!(letter, "B");
        assert_eq!(tier, ExtractionTier::AnswerColon);
    }

    #[test]
    fn test_answer_colon_prefers_last_on_line() {
        let text = "Answer: A ... wait, answer: E";
        assert_eq!(extract_answer(text).as_deref(), Some("E"));
    }

    #[test]
    fn test_answer_colon_stops_at_first_matching_line() {
        // `.` does not cross newlines, so a later line's `Answer:` is not preferred
        let text = "Answer: A\nLet me double check.\nAnswer: B";
        let (letter, tier) = extract_answer_with_tier(text).unwrap();
        assert_eq!(letter, "A");
        assert_eq!(tier, ExtractionTier::AnswerColon);
    }

    #[test]
    fn test_letter_outside_option_range_is_kept() {
        assert_eq!(extract_answer("Neither fits, so J").as_deref(), Some("J"));
    }

    #[test]
    fn test_answer_colon_across_whitespace() {
        assert_eq!(extract_answer("Final Answer:\n  G").as_deref(), Some("G"));
    }

    #[test]
    fn test_last_standalone_letter() {
        let text = "Option A is wrong.\nI pick D, though F is close";
        let (letter, tier) = extract_answer_with_tier(text).unwrap();
        assert_eq!(letter, "F");
        assert_eq!(tier, ExtractionTier::LastLetter);
    }

    #[test]
    fn test_letters_inside_words_are_ignored() {
        assert_eq!(extract_answer("Because AB and CD"), None);
    }

    #[test]
    fn test_tier_one_wins_over_earlier_colon_form() {
        let text = "Answer: A\nActually, the answer is (B).";
        assert_eq!(extract_answer(text).as_deref(), Some("B"));
    }

    #[test]
    fn test_normalize_strips_bold() {
        let text = normalize_output("The answer is **(D)**");
        assert_eq!(text, "The answer is (D)");
        assert_eq!(extract_answer(&text).as_deref(), Some("D"));
    }
}
