//! Chain-of-thought prompt assembly

use super::{Question, CHOICE_LETTERS};

const DEFAULT_COT: &str = "Let's think step by step.";

/// Render one question block with its options and answer lead-in
///
/// An empty `cot_content` becomes the generic step-by-step cue, and a
/// leading `A: ` is removed from worked examples.
pub fn format_example(question: &str, options: &[String], cot_content: &str) -> String {
    let cot = if cot_content.is_empty() {
        DEFAULT_COT
    } else {
        cot_content.strip_prefix("A: ").unwrap_or(cot_content)
    };

    let mut example = format!("Question: {}\nOptions: ", question);
    for (letter, opt) in CHOICE_LETTERS.chars().zip(options) {
        example.push_str(&format!("{}. {}\n", letter, opt));
    }
    example.push_str("Answer: ");
    example.push_str(cot);
    example.push_str("\n\n");
    example
}

/// Build the full user message: instruction, few-shot examples, then the question
pub fn build_prompt(question: &Question, cot_examples: &[Question]) -> String {
    let mut prompt = format!(
        "The following are multiple choice questions (with answers) about {}. Think step by \
         step and then output the answer in the format of \"The answer is (X)\" at the end.\n\n",
        question.category
    );
    for example in cot_examples {
        prompt.push_str(&format_example(&example.question, &example.options, &example.cot_content));
    }
    prompt.push_str(&format_example(&question.question, &question.options, ""));
    prompt
}
