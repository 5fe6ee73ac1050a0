// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic query-type classification.
//!
//! Classifies queries into token-budget categories using zero-cost
//! keyword and regex rules. No LLM pre-call, no network, no latency.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Query categories, each with its own token-budget factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Greetings, acknowledgements, one-word answers.
    Minimal,
    /// General conversation.
    Chat,
    /// "Explain", "describe", "what is" style questions.
    Explanation,
    /// Code generation, review, or debugging.
    Code,
    /// Multi-step logical or mathematical reasoning.
    Reasoning,
    /// Open-ended analysis, comparison, evaluation.
    Analysis,
    /// Several independent asks in one message.
    Multipart,
}

impl QueryType {
    /// Token-budget multiplier for this category.
    pub fn factor(self) -> f64 {
        match self {
            QueryType::Minimal => 0.5,
            QueryType::Chat => 0.8,
            QueryType::Explanation => 1.2,
            QueryType::Code => 1.5,
            QueryType::Reasoning => 1.8,
            QueryType::Analysis => 2.0,
            QueryType::Multipart => 2.5,
        }
    }
}

/// Minimal patterns (exact match, case-insensitive).
const MINIMAL_EXACT: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "bye", "ok", "okay",
    "yes", "no", "sure", "good", "great", "nice", "yep", "nope", "yeah",
];

/// Code indicator patterns (contains, case-insensitive).
const CODE_INDICATORS: &[&str] = &[
    "write a function", "write code", "write a program", "implement",
    "refactor", "debug", "fix this code", "code review", "unit test",
    "stack trace", "compile", "regex", "sql query", "script",
];

/// Reasoning indicator patterns (contains, case-insensitive).
const REASONING_INDICATORS: &[&str] = &[
    "step by step", "prove", "derive", "solve", "calculate", "logic",
    "if and only if", "work out", "reason through",
];

/// Analysis indicator patterns (contains, case-insensitive).
const ANALYSIS_INDICATORS: &[&str] = &[
    "analyze", "analyse", "compare", "evaluate", "trade-off", "tradeoff",
    "pros and cons", "assess", "in depth", "comprehensive", "review the",
];

/// Explanation indicator patterns (contains, case-insensitive).
const EXPLANATION_INDICATORS: &[&str] = &[
    "explain", "describe", "what is", "what are", "how does", "how do",
    "why does", "why is", "tell me about",
];

/// Numbered-list pattern marking a multipart request.
fn numbered_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\d+[.)]\s").expect("static regex"))
}

/// Classify a query into a token-budget category.
///
/// Precedence: minimal > multipart > code > analysis > reasoning >
/// explanation > chat. Deterministic for identical input.
pub fn classify(query: &str) -> QueryType {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return QueryType::Minimal;
    }

    let lower = trimmed.to_lowercase();
    let word_count = trimmed.split_whitespace().count();

    if word_count <= 3 && MINIMAL_EXACT.iter().any(|p| lower == *p) {
        return QueryType::Minimal;
    }

    // Multiple questions or an enumerated list of asks.
    let question_count = trimmed.matches('?').count();
    if question_count >= 2 || numbered_list_re().is_match(trimmed) {
        return QueryType::Multipart;
    }

    if trimmed.contains("```") || CODE_INDICATORS.iter().any(|p| lower.contains(p)) {
        return QueryType::Code;
    }

    if ANALYSIS_INDICATORS.iter().any(|p| lower.contains(p)) {
        return QueryType::Analysis;
    }

    if REASONING_INDICATORS.iter().any(|p| lower.contains(p)) {
        return QueryType::Reasoning;
    }

    if EXPLANATION_INDICATORS.iter().any(|p| lower.contains(p)) {
        return QueryType::Explanation;
    }

    if word_count <= 2 {
        return QueryType::Minimal;
    }

    QueryType::Chat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_minimal_greetings() {
        assert_eq!(classify("hi"), QueryType::Minimal);
        assert_eq!(classify("thanks"), QueryType::Minimal);
        assert_eq!(classify("ok"), QueryType::Minimal);
        assert_eq!(classify(""), QueryType::Minimal);
        assert_eq!(classify("   "), QueryType::Minimal);
    }

    #[test]
    fn classify_chat_default() {
        assert_eq!(
            classify("what's the weather looking like today"),
            QueryType::Chat
        );
    }

    #[test]
    fn classify_explanation() {
        assert_eq!(
            classify("explain the borrow checker to me"),
            QueryType::Explanation
        );
        assert_eq!(classify("what is a monad"), QueryType::Explanation);
    }

    #[test]
    fn classify_code() {
        assert_eq!(
            classify("write a function that reverses a linked list"),
            QueryType::Code
        );
        assert_eq!(
            classify("can you fix this?\n```\nfn main() { panic!() }\n```"),
            QueryType::Code
        );
    }

    #[test]
    fn classify_reasoning() {
        assert_eq!(
            classify("solve this step by step: x^2 - 5x + 6 = 0"),
            QueryType::Reasoning
        );
    }

    #[test]
    fn classify_analysis() {
        assert_eq!(
            classify("compare postgres and sqlite for an embedded workload"),
            QueryType::Analysis
        );
    }

    #[test]
    fn classify_multipart_questions() {
        assert_eq!(
            classify("what's the capital of France? and what's its population?"),
            QueryType::Multipart
        );
    }

    #[test]
    fn classify_multipart_numbered_list() {
        let query = "please do the following:\n1. summarize the meeting\n2. draft a reply\n3. list action items";
        assert_eq!(classify(query), QueryType::Multipart);
    }

    #[test]
    fn factors_are_ordered() {
        assert!(QueryType::Minimal.factor() < QueryType::Chat.factor());
        assert!(QueryType::Chat.factor() < QueryType::Explanation.factor());
        assert!(QueryType::Explanation.factor() < QueryType::Code.factor());
        assert!(QueryType::Code.factor() < QueryType::Reasoning.factor());
        assert!(QueryType::Reasoning.factor() < QueryType::Analysis.factor());
        assert!(QueryType::Analysis.factor() < QueryType::Multipart.factor());
    }

    #[test]
    fn classification_is_deterministic() {
        let query = "explain how TCP congestion control works";
        let first = classify(query);
        for _ in 0..10 {
            assert_eq!(classify(query), first);
        }
    }
}
