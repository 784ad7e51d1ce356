//! Field normalizer - per-column cleaning rules for the raw record set
//!
//! Rules are registered by column and grouped into phases. Phases always
//! run in the same order regardless of registration order:
//! column drops, then missing-value defaults, then text cleaning, then
//! required-column row filtering. A defaulted value therefore still passes
//! through cleaning, and row survival depends on the cleaned value.

use crate::domain::job::{Column, JobRow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, info};

pub const DEFAULT_SALARY: &str = "Not Disclosed";
pub const DEFAULT_QUALIFICATION: &str = "Any Graduate";
pub const DEFAULT_VACANCIES: &str = "1";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static COMPANY_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s&/-]").expect("valid regex"));
static NEWLINES_TABS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\t]+").expect("valid regex"));
static SPACED_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([-\u{2013}])\s+").expect("valid regex"));

/// Pure text transform. `None` means the value is dropped (becomes absent).
pub type CleanFn = fn(&str) -> Option<String>;

/// What a rule does to its column
#[derive(Debug, Clone, Copy)]
pub enum RuleAction {
    /// Remove the column from every row regardless of content
    DropColumn,
    /// Fill an absent value with a default
    FillMissing(&'static str),
    /// Rewrite a present value
    Clean(CleanFn),
    /// Drop the whole row when the column is absent
    RequirePresent,
}

impl RuleAction {
    fn phase(&self) -> u8 {
        match self {
            RuleAction::DropColumn => 0,
            RuleAction::FillMissing(_) => 1,
            RuleAction::Clean(_) => 2,
            RuleAction::RequirePresent => 3,
        }
    }
}

/// A named rule bound to one column
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub name: &'static str,
    pub column: Column,
    pub action: RuleAction,
}

impl ColumnRule {
    pub const fn new(name: &'static str, column: Column, action: RuleAction) -> Self {
        Self { name, column, action }
    }
}

/// Registry of column rules applied to a whole record set
#[derive(Debug, Clone, Default)]
pub struct FieldNormalizer {
    rules: Vec<ColumnRule>,
}

impl FieldNormalizer {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical rule set for job postings
    pub fn standard() -> Self {
        Self::new()
            .with_rule(ColumnRule::new(
                "drop_hiring_location",
                Column::HiringLocation,
                RuleAction::DropColumn,
            ))
            .with_rule(ColumnRule::new(
                "default_salary",
                Column::Salary,
                RuleAction::FillMissing(DEFAULT_SALARY),
            ))
            .with_rule(ColumnRule::new(
                "default_qualification",
                Column::Qualification,
                RuleAction::FillMissing(DEFAULT_QUALIFICATION),
            ))
            .with_rule(ColumnRule::new(
                "default_vacancies",
                Column::Vacancies,
                RuleAction::FillMissing(DEFAULT_VACANCIES),
            ))
            .with_rule(ColumnRule::new(
                "clean_qualification",
                Column::Qualification,
                RuleAction::Clean(|v| Some(clean_qualification(v))),
            ))
            .with_rule(ColumnRule::new(
                "clean_title",
                Column::Title,
                RuleAction::Clean(|v| Some(clean_title(v))),
            ))
            .with_rule(ColumnRule::new(
                "clean_company_name",
                Column::CompanyName,
                RuleAction::Clean(|v| Some(clean_company_name(v))),
            ))
            .with_rule(ColumnRule::new(
                "clean_job_id",
                Column::JobId,
                RuleAction::Clean(extract_job_id),
            ))
            .with_rule(ColumnRule::new(
                "clean_experience",
                Column::Experience,
                RuleAction::Clean(|v| Some(clean_experience(v))),
            ))
            .with_rule(ColumnRule::new(
                "clean_vacancies",
                Column::Vacancies,
                RuleAction::Clean(|v| Some(clean_vacancies(v))),
            ))
            .with_rule(ColumnRule::new(
                "require_job_id",
                Column::JobId,
                RuleAction::RequirePresent,
            ))
    }

    /// Register an additional rule
    pub fn with_rule(mut self, rule: ColumnRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    /// Apply every rule to the record set, returning the surviving rows
    pub fn normalize(&self, rows: Vec<JobRow>) -> Vec<JobRow> {
        let input_len = rows.len();
        let mut ordered: Vec<&ColumnRule> = self.rules.iter().collect();
        // stable: registration order is kept within a phase
        ordered.sort_by_key(|rule| rule.action.phase());

        let mut rows = rows;
        for rule in ordered {
            debug!("Applying rule '{}' to column '{}'", rule.name, rule.column);
            rows = apply_rule(rule, rows);
        }

        info!(
            "Normalized record set: {} rows in, {} rows kept",
            input_len,
            rows.len()
        );
        rows
    }
}

fn apply_rule(rule: &ColumnRule, mut rows: Vec<JobRow>) -> Vec<JobRow> {
    match rule.action {
        RuleAction::DropColumn => {
            for row in &mut rows {
                row.take(rule.column);
            }
        }
        RuleAction::FillMissing(default) => {
            for row in &mut rows {
                if row.get(rule.column).is_none() {
                    row.set(rule.column, Some(default.to_string()));
                }
            }
        }
        RuleAction::Clean(clean) => {
            for row in &mut rows {
                if let Some(value) = row.take(rule.column) {
                    row.set(rule.column, clean(&value));
                }
            }
        }
        RuleAction::RequirePresent => {
            let before = rows.len();
            rows.retain(|row| row.get(rule.column).is_some());
            if rows.len() < before {
                info!(
                    "Dropped {} rows missing '{}'",
                    before - rows.len(),
                    rule.column
                );
            }
        }
    }
    rows
}

/// Word title casing: a letter is upper-cased when it does not
/// follow another letter, lower-cased otherwise.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// Deduplicate and sort a comma separated qualification list
pub fn clean_qualification(text: &str) -> String {
    let flattened = text.replace("\r\n", " ").replace('\n', " ");
    let flattened = collapse_whitespace(&flattened);

    let unique: BTreeSet<&str> = flattened
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    unique.into_iter().collect::<Vec<_>>().join(", ")
}

pub fn clean_title(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| *c != '"' && *c != '|').collect();
    title_case(&collapse_whitespace(&stripped))
}

/// Keeps word characters, whitespace, `&`, `/` and `-`. Words that were only
/// separated by stripped punctuation merge into one token.
pub fn clean_company_name(text: &str) -> String {
    let stripped = COMPANY_DISALLOWED.replace_all(text, "");
    title_case(&collapse_whitespace(&stripped))
}

/// First run of ASCII digits, or `None` when there is none
pub fn extract_job_id(text: &str) -> Option<String> {
    DIGIT_RUN.find(text).map(|m| m.as_str().to_string())
}

/// `"2 - 4 years"` becomes `"2-4 years"`; en-dash ranges keep their dash
pub fn clean_experience(text: &str) -> String {
    let without_breaks = NEWLINES_TABS.replace_all(text, "");
    SPACED_RANGE
        .replace_all(&without_breaks, "$1")
        .trim()
        .to_string()
}

/// First digit run, falling back to the default vacancy count.
/// A run too large for `u32` saturates.
pub fn clean_vacancies(text: &str) -> String {
    DIGIT_RUN.find(text).map_or_else(
        || DEFAULT_VACANCIES.to_string(),
        |m| {
            let count = m.as_str().parse::<u32>().unwrap_or_else(|_| {
                debug!("Vacancy count {} out of range, saturating", m.as_str());
                u32::MAX
            });
            count.to_string()
        },
    )
}
