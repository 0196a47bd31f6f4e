//! OCR text matching against enrolled card identities.
//!
//! Recognition output from embossed/printed card fonts is noisy, so matching
//! runs through a prioritized list of strategies, strict to loose: direct
//! roll-number containment, pattern-extracted roll comparison, fuzzy roll
//! similarity, then fuzzy name/branch similarity. The first candidate that
//! satisfies any strategy wins and no further candidates are checked.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// An enrolled identity's card-text fields, read-only comparison input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdentity {
    pub identity_id: String,
    pub roll_no: String,
    pub full_name: String,
    pub branch: String,
}

/// Which strategy produced a match, recorded for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchRule {
    RollSubstring,
    RollPattern,
    RollFuzzy,
    NameOrBranchFuzzy,
}

#[derive(Debug, PartialEq)]
pub struct TextMatch<'a> {
    pub identity: &'a CardIdentity,
    pub rule: MatchRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextMatchConfig {
    /// Minimum fuzzy ratio between a candidate roll number and the
    /// normalized extracted text (exclusive).
    pub roll_fuzzy_threshold: f64,
    /// Minimum fuzzy ratio between a candidate name/branch and the raw
    /// extracted text (inclusive).
    pub name_fuzzy_threshold: f64,
}

impl Default for TextMatchConfig {
    fn default() -> Self {
        Self {
            roll_fuzzy_threshold: 0.65,
            name_fuzzy_threshold: 0.4,
        }
    }
}

/// Normalize noisy OCR text: lowercase, map visually-confusable letters to
/// the digits they are misread from, strip everything non-alphanumeric.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'o' => Some('0'),
            'i' | 'l' => Some('1'),
            's' => Some('5'),
            'b' => Some('8'),
            'g' => Some('6'),
            'z' => Some('2'),
            'q' => Some('9'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

fn roll_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 1-3 letter prefix, 2-6 digits, optional short alphanumeric suffix
    PATTERN.get_or_init(|| Regex::new(r"[a-z]{1,3}\d{2,6}[a-z0-9]{0,4}").unwrap())
}

/// Pull a roll-number-shaped token out of the raw lowercased text.
fn detect_roll(raw: &str) -> Option<String> {
    roll_pattern()
        .find(raw)
        .map(|m| m.as_str().replace([' ', '-'], ""))
}

/// Pre-computed views of the extracted text shared by all strategies.
struct Query {
    raw: String,
    normalized: String,
    detected_roll: Option<String>,
}

fn strip(roll: &str) -> String {
    roll.to_lowercase().replace([' ', '-'], "")
}

fn roll_substring(candidate: &CardIdentity, query: &Query, _cfg: &TextMatchConfig) -> bool {
    let roll = normalize_text(&candidate.roll_no);
    !roll.is_empty() && query.normalized.contains(&roll)
}

fn roll_detected_pattern(candidate: &CardIdentity, query: &Query, _cfg: &TextMatchConfig) -> bool {
    let Some(detected) = &query.detected_roll else {
        return false;
    };
    let roll = strip(&candidate.roll_no);
    !roll.is_empty() && (detected.contains(&roll) || roll.contains(detected.as_str()))
}

fn roll_fuzzy(candidate: &CardIdentity, query: &Query, cfg: &TextMatchConfig) -> bool {
    let roll = normalize_text(&candidate.roll_no);
    !roll.is_empty()
        && strsim::normalized_levenshtein(&roll, &query.normalized) > cfg.roll_fuzzy_threshold
}

fn name_or_branch_fuzzy(candidate: &CardIdentity, query: &Query, cfg: &TextMatchConfig) -> bool {
    let similar = |field: &str| {
        !field.is_empty()
            && strsim::normalized_levenshtein(&field.to_lowercase(), &query.raw)
                >= cfg.name_fuzzy_threshold
    };
    similar(&candidate.full_name) || similar(&candidate.branch)
}

type Strategy = fn(&CardIdentity, &Query, &TextMatchConfig) -> bool;

// Strict to loose; order is load-bearing.
const STRATEGIES: &[(MatchRule, Strategy)] = &[
    (MatchRule::RollSubstring, roll_substring),
    (MatchRule::RollPattern, roll_detected_pattern),
    (MatchRule::RollFuzzy, roll_fuzzy),
    (MatchRule::NameOrBranchFuzzy, name_or_branch_fuzzy),
];

/// Match extracted OCR text against the candidate identities.
///
/// Candidates are tried in order; for each, the strategies run strict to
/// loose and the first hit wins overall. Returns `None` when nothing
/// matches — an unreadable card never resolves to an identity.
pub fn match_by_text<'a>(
    extracted: &str,
    candidates: &'a [CardIdentity],
    cfg: &TextMatchConfig,
) -> Option<TextMatch<'a>> {
    let raw = extracted.to_lowercase();
    if raw.trim().is_empty() {
        return None;
    }

    let query = Query {
        normalized: normalize_text(&raw),
        detected_roll: detect_roll(&raw),
        raw,
    };

    if let Some(detected) = &query.detected_roll {
        tracing::debug!(roll = %detected, "roll-number pattern detected in OCR text");
    }

    for candidate in candidates {
        for (rule, strategy) in STRATEGIES {
            if strategy(candidate, &query, cfg) {
                tracing::info!(
                    identity = %candidate.identity_id,
                    rule = ?rule,
                    "card text matched"
                );
                return Some(TextMatch {
                    identity: candidate,
                    rule: *rule,
                });
            }
        }
    }

    tracing::debug!(text = %query.raw, "no identity matched extracted text");
    None
}
