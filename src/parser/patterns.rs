//! Deterministic extraction by pattern matching.
//!
//! Always available and side-effect free: the same text always yields the
//! same [`ParsedQuery`].
//!
//! A numeric *mention* is a number with an optional unit. Mentions joined by
//! a separator (`to`, `and`, `-`) form a closed range; a single mention takes
//! its direction from the comparator in front of it:
//!
//! ```text
//! between 10^16 and 10^18 m^-3   -> density [1e16, 1e18]
//! temperature above 10 keV       -> temperature [10, )
//! temperature below 500          -> temperature ( , 500] keV (unit inferred)
//! ```

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::numeric::parse_number;
use crate::model::{Intent, ParsedQuery, QuantityRange, QuantityType, Strategy, TemporalConstraint};

const COMPARATORS: &str = r"\b(?:between|from|above|over|greater\s+than|more\s+than|higher\s+than|exceeding|at\s+least|below|under|less\s+than|lower\s+than|at\s+most|up\s+to)\b|>=|<=|≥|≤|>|<";

const NUMBER: &str = r"\b\d+(?:\.\d+)?(?:\s*[x×*]\s*10(?:\s*\^\s*\{?[+-]?\d*\}?)?|\s*\^\s*\{?[+-]?\d*\}?|e[+-]?\d+)?";

static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?P<num>{})(?:\s*(?P<unit>{}))?",
        NUMBER,
        unit_alternation()
    ))
    .expect("valid mention regex")
});

static TRAILING_COMPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)(?P<cmp>{})\s*$", COMPARATORS)).expect("valid comparator regex")
});

static RANGE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:to|and|-|–)\s*$").expect("valid separator regex"));

static QUANTITY_WORD: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<&str> = QuantityType::ALL
        .iter()
        .flat_map(|q| q.vocabulary().iter().copied())
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))).expect("valid quantity regex")
});

static YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:published\s+in|in|during|from)\s+(?P<year>(?:19|20)\d{2})\b")
        .expect("valid year regex")
});

static POSTFIX_COMPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*or\s+(?P<cmp>less|lower|below|under|more|higher|above|greater|over)\b")
        .expect("valid postfix comparator regex")
});

static RANGE_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:to|and|-|–)\s*\d").expect("valid regex"));

static RECENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:recent|recently|latest|newest)\b").expect("valid regex"));

static STATISTICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:statistics|stats|average|how\s+many)\b")
        .expect("valid regex")
});

static COMPARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:compare|comparison|versus|vs)\b").expect("valid regex"));

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

#[rustfmt::skip]
static STOPWORDS: &[&str] = &[
    "a", "about", "above", "all", "among", "an", "and", "any", "are", "around", "article",
    "articles", "as", "at", "average", "be", "below", "between", "by", "compare", "comparison",
    "data", "during", "exceeding", "find", "for", "from", "get", "give",
    "greater", "have", "high", "higher", "how", "i", "in", "is", "latest", "least", "less",
    "list", "look", "looking", "low", "lower", "many", "me", "measured", "measurement",
    "measurements", "more", "most", "new", "newest", "of", "on", "or", "over", "paper",
    "papers", "please", "publication", "publications", "published", "range", "recent",
    "recently", "report", "reported", "reporting", "research", "result", "results", "search",
    "show", "some", "stats", "statistics", "studies", "study", "than", "that", "the", "their",
    "there", "these", "this", "to", "under", "up", "value", "values", "versus", "vs", "want",
    "was", "were", "what", "where", "which", "with", "within", "work", "works", "year", "years",
];

/// Words that only spell units (`per cubic meter`, `keV`, ...).
static UNIT_WORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    QuantityType::ALL
        .iter()
        .flat_map(|q| q.conversions())
        .flat_map(|c| c.spellings())
        .flat_map(|s| {
            WORD.find_iter(s)
                .map(|m| m.as_str().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .collect()
});

/// Regex alternation over every unit spelling, longest first.
fn unit_alternation() -> String {
    let mut spellings: Vec<String> = QuantityType::ALL
        .iter()
        .flat_map(|q| q.conversions())
        .flat_map(|c| c.spellings())
        .map(str::to_lowercase)
        .collect();
    spellings.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    spellings.dedup();

    spellings
        .iter()
        .map(|s| {
            let mut pattern = regex::escape(s).replace(' ', r"\s+");
            if s.ends_with(|c: char| c.is_alphanumeric()) {
                pattern.push_str(r"\b");
            }
            pattern
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Direction implied by a comparator word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Lower,
    Upper,
}

/// Comparator at the end of `lead`, if any.
fn leading_comparator(lead: &str) -> Option<&str> {
    TRAILING_COMPARATOR
        .captures(lead)
        .and_then(|caps| caps.name("cmp"))
        .map(|m| m.as_str())
}

/// Whether a mention after `comparator` may start a closed range.
fn opens_range(comparator: Option<&str>) -> bool {
    match comparator {
        None => true,
        Some(c) => matches!(c.to_lowercase().as_str(), "between" | "from"),
    }
}

/// Direction of an `or less` / `or more` phrase right after a value.
fn postfix_bound(trail: &str) -> Option<Bound> {
    let caps = POSTFIX_COMPARATOR.captures(trail)?;
    let word = caps.name("cmp")?.as_str().to_lowercase();
    Some(match word.as_str() {
        "less" | "lower" | "below" | "under" => Bound::Upper,
        _ => Bound::Lower,
    })
}

fn comparator_bound(comparator: &str) -> Bound {
    let normalized = comparator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    match normalized.as_str() {
        "below" | "under" | "less than" | "lower than" | "at most" | "up to" | "<" | "<="
        | "≤" => Bound::Upper,
        _ => Bound::Lower,
    }
}

#[derive(Debug, Clone)]
struct Mention<'a> {
    span: Range<usize>,
    number: &'a str,
    unit: Option<&'a str>,
}

impl Mention<'_> {
    fn quantity(&self) -> Option<QuantityType> {
        self.unit.and_then(QuantityType::for_unit)
    }
}

/// What was pulled out of one numeric phrase.
struct Extracted {
    range: Option<QuantityRange>,
    inferred_unit: bool,
}

/// Pattern-based [`ParsedQuery`] extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a [`ParsedQuery`] from free text. Never fails.
    pub fn extract(&self, text: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::empty(text);
        parsed.strategy = Strategy::Deterministic;

        let year = find_year(text);
        parsed.temporal_constraint = match year {
            Some((_, y)) => Some(TemporalConstraint::Year(y)),
            None if RECENT.is_match(text) => Some(TemporalConstraint::Recent),
            None => None,
        };

        parsed.intent = if STATISTICS.is_match(text) {
            Intent::Statistics
        } else if COMPARE.is_match(text) {
            Intent::Compare
        } else {
            Intent::Search
        };

        let year_span = year.map(|(span, _)| span);
        let mentions: Vec<Mention> = MENTION
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.name("num")?;
                Some(Mention {
                    span: whole.range(),
                    number: number.as_str(),
                    unit: caps.name("unit").map(|u| u.as_str()),
                })
            })
            .filter(|m| match &year_span {
                Some(span) => m.span.end <= span.start || m.span.start >= span.end,
                None => true,
            })
            .collect();

        let mut inferred = 0usize;
        let mut prev_end = 0usize;
        let mut i = 0;
        while i < mentions.len() {
            let first = &mentions[i];
            let lead = &text[prev_end.min(first.span.start)..first.span.start];

            // A one-sided comparator keeps its value to itself:
            // "above 5 keV and 2 MW" is not the range [2, 5].
            let second = mentions.get(i + 1).filter(|next| {
                opens_range(leading_comparator(lead))
                    && RANGE_SEPARATOR.is_match(&text[first.span.end..next.span.start])
                    && match (first.quantity(), next.quantity()) {
                        (Some(a), Some(b)) => a == b,
                        _ => true,
                    }
            });

            let trail = &text[first.span.end..];
            let extracted = extract_phrase(lead, trail, first, second);
            if let Some(range) = extracted.range {
                if parsed.add_range(range) && extracted.inferred_unit {
                    inferred += 1;
                }
            }

            let consumed = if second.is_some() { 2 } else { 1 };
            prev_end = mentions[i + consumed - 1].span.end;
            i += consumed;
        }

        for keyword in keywords(text) {
            parsed.add_keyword(&keyword);
        }

        let confidence = if parsed.is_empty() {
            0.1
        } else {
            (0.5 - 0.1 * inferred as f64).max(0.1)
        };
        parsed.set_confidence(confidence);
        parsed
    }
}

/// First `in 2023`-style year that is not really a measurement.
///
/// `from 1900 to 2000 K` is a temperature range, not a year.
fn find_year(text: &str) -> Option<(Range<usize>, i32)> {
    YEAR.captures_iter(text).find_map(|caps| {
        let m = caps.name("year")?;
        let has_unit = MENTION
            .captures(&text[m.start()..])
            .filter(|c| c.get(0).is_some_and(|w| w.start() == 0))
            .and_then(|c| c.name("unit"))
            .is_some();
        if has_unit || RANGE_CONTINUATION.is_match(&text[m.end()..]) {
            return None;
        }
        Some((m.range(), m.as_str().parse().ok()?))
    })
}

/// Turn one mention, or a pair of mentions, into a range.
///
/// `lead` is the text between the previous phrase and this one, `trail`
/// everything after the first mention.
fn extract_phrase(
    lead: &str,
    trail: &str,
    first: &Mention,
    second: Option<&Mention>,
) -> Extracted {
    let dropped = Extracted {
        range: None,
        inferred_unit: false,
    };

    let direction = match second {
        Some(_) => None,
        None => leading_comparator(lead)
            .map(comparator_bound)
            .or_else(|| postfix_bound(trail)),
    };

    let stated_unit = second.and_then(|s| s.unit).or(first.unit);
    let (quantity, unit, inferred_unit) = match stated_unit.and_then(QuantityType::for_unit) {
        Some(q) => (q, stated_unit.unwrap_or(q.canonical_unit()), false),
        None => {
            // A bare number is only a range when a quantity word and a
            // comparator or separator point at it.
            if direction.is_none() && second.is_none() {
                return dropped;
            }
            let Some(q) = QUANTITY_WORD
                .find_iter(lead)
                .last()
                .and_then(|m| QuantityType::from_name(m.as_str()))
            else {
                return dropped;
            };
            (q, q.canonical_unit(), true)
        }
    };

    let Some(a) = parse_number(first.number) else {
        return dropped;
    };
    // Restate the first value in the range's unit when both ends carry one.
    let a = match (first.unit, second.and_then(|s| s.unit)) {
        (Some(ua), Some(ub)) => quantity.denormalize(quantity.normalize(a, ua), ub),
        _ => a,
    };

    let (min, max) = match second {
        Some(s) => match parse_number(s.number) {
            Some(b) => (Some(a), Some(b)),
            None => return dropped,
        },
        None => match direction {
            Some(Bound::Upper) => (None, Some(a)),
            _ => (Some(a), None),
        },
    };

    Extracted {
        range: QuantityRange::new(quantity, min, max, unit),
        inferred_unit,
    }
}

/// Content words of the query, lower-cased and roughly singular.
fn keywords(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in WORD.find_iter(text) {
        let word = m.as_str().to_lowercase();
        if !is_content_word(&word) {
            continue;
        }
        let word = singularize(&word);
        if !is_content_word(&word) || out.contains(&word) {
            continue;
        }
        out.push(word);
    }
    out
}

fn is_content_word(word: &str) -> bool {
    word.chars().count() > 1
        && !word.chars().any(|c| c.is_numeric())
        && !STOPWORDS.contains(&word)
        && !UNIT_WORDS.contains(word)
        && QuantityType::from_name(word).is_none()
}

fn singularize(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.chars().count() > 1 {
            return format!("{}y", stem);
        }
    }
    if ["ss", "us", "is", "ics"].iter().any(|s| word.ends_with(s)) {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}
