//! Statistics queries: aggregates over measured values.

use super::filters::{keyword_filter, range_filter, temporal_filter};
use super::schema::{
    document_field_pattern, document_pattern, measurement_patterns, prefixes, DocumentField,
    MeasurementVars, PAPER_VAR,
};
use super::CompileOptions;
use crate::model::ParsedQuery;
use crate::sparql::{avg, count, count_distinct, max, min, var, ExprExt, SelectQuery};

/// Aggregates over the first requested quantity, or a paper count when none.
///
/// Filters are the same as for a search, so the numbers describe exactly
/// the rows a search would return.
pub(super) fn build(parsed: &ParsedQuery, options: &CompileOptions) -> SelectQuery {
    let mut projection = vec![count_distinct(var(PAPER_VAR)).alias("paperCount")];
    if let Some(quantity) = parsed.parameters.keys().next() {
        let normalized = MeasurementVars::for_quantity(*quantity).normalized;
        projection.extend([
            count(var(&normalized)).alias("measurementCount"),
            avg(var(&normalized)).alias("avgValue"),
            min(var(&normalized)).alias("minValue"),
            max(var(&normalized)).alias("maxValue"),
        ]);
    }

    let mut query = SelectQuery::new().select(projection);
    for prefix in prefixes() {
        query = query.prefix(prefix);
    }
    query = query.pattern(document_pattern());

    for (quantity, range) in &parsed.parameters {
        query = query.patterns(measurement_patterns(*quantity));
        if let Some(condition) = range_filter(range) {
            query = query.filter(condition);
        }
    }

    if let Some(temporal) = parsed.temporal_constraint {
        query = query
            .pattern(document_field_pattern(DocumentField::PublicationDate))
            .filter(temporal_filter(temporal, options));
    }

    if let Some(condition) = keyword_filter(&parsed.keywords, options.match_abstract) {
        if options.match_abstract {
            query = query.pattern(document_field_pattern(DocumentField::Abstract));
        }
        query = query.filter(condition);
    }

    query.limit(options.effective_limit())
}
