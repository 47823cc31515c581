//! FILTER conditions shared by the search and statistics builders.

use chrono::{Days, NaiveDate};

use super::schema::{DocumentField, MeasurementVars};
use super::{CompileOptions, MissingDatePolicy};
use crate::model::{QuantityRange, TemporalConstraint};
use crate::sparql::{
    any_of, bound, coalesce, lit_str, regex, str_, strstarts, var, Expr, ExprExt,
};

/// `?xNormalized >= min && ?xNormalized <= max`, one side when one bound is set.
///
/// `None` when no finite bound remains.
pub fn range_filter(range: &QuantityRange) -> Option<Expr> {
    let normalized = MeasurementVars::for_quantity(range.quantity()).normalized;
    let lower = range
        .normalized_min()
        .filter(|v| v.is_finite())
        .map(|v| var(&normalized).gte(v));
    let upper = range
        .normalized_max()
        .filter(|v| v.is_finite())
        .map(|v| var(&normalized).lte(v));

    match (lower, upper) {
        (Some(lower), Some(upper)) => Some(lower.and(upper)),
        (lower, upper) => lower.or(upper),
    }
}

/// Escape XPath regex metacharacters so a keyword matches literally.
///
/// `regex::escape` would also escape `#`, `&` and `~`, which XPath rejects.
pub fn escape_regex(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(
            c,
            '\\' | '.' | '?' | '*' | '+' | '(' | ')' | '{' | '}' | '-' | '[' | ']' | '^' | '$'
                | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One case-insensitive alternation over all keywords.
pub fn keyword_pattern(keywords: &[String]) -> Option<String> {
    let parts: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(escape_regex)
        .collect();
    (!parts.is_empty()).then(|| parts.join("|"))
}

/// `REGEX(?title, p, "i")`, plus the abstract when `match_abstract` is on.
pub fn keyword_filter(keywords: &[String], match_abstract: bool) -> Option<Expr> {
    let pattern = keyword_pattern(keywords)?;
    let title = regex(var(DocumentField::Title.var()), &pattern, "i");
    if !match_abstract {
        return Some(title);
    }
    let abstract_text = coalesce(vec![var(DocumentField::Abstract.var()), lit_str("")]);
    any_of([title, regex(abstract_text, &pattern, "i")])
}

/// First day still counted as recent.
pub fn recent_cutoff(today: NaiveDate, recent_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(recent_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Date condition for `temporal`, honouring the missing-date policy.
pub fn temporal_filter(temporal: TemporalConstraint, options: &CompileOptions) -> Expr {
    let date = str_(var(DocumentField::PublicationDate.var()));
    let condition = match temporal {
        TemporalConstraint::Recent => {
            let cutoff = recent_cutoff(options.today, options.recent_days);
            date.gte(cutoff.format("%Y-%m-%d").to_string())
        }
        TemporalConstraint::Year(year) => strstarts(date, &format!("{:04}", year)),
    };

    match options.missing_dates {
        MissingDatePolicy::Exclude => condition,
        MissingDatePolicy::Include => bound(DocumentField::PublicationDate.var())
            .not()
            .or(condition),
    }
}
