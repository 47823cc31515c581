//! Search queries: matching papers with their metadata.

use super::filters::{keyword_filter, range_filter, temporal_filter};
use super::schema::{
    document_field_pattern, document_pattern, measurement_patterns, prefixes, DocumentField,
    MeasurementVars, PAPER_VAR,
};
use super::{CompileOptions, ResultOrder};
use crate::model::ParsedQuery;
use crate::sparql::{var, OrderByExpr, Projection, SelectQuery};

/// Metadata fields every search row carries, after `?paper`.
const RESULT_FIELDS: [DocumentField; 3] = [
    DocumentField::Title,
    DocumentField::Authors,
    DocumentField::PublicationDate,
];

pub(super) fn build(parsed: &ParsedQuery, options: &CompileOptions) -> SelectQuery {
    let mut projection = vec![Projection::var(PAPER_VAR)];
    projection.extend(RESULT_FIELDS.iter().map(|f| Projection::var(f.var())));
    for quantity in parsed.parameters.keys() {
        let vars = MeasurementVars::for_quantity(*quantity);
        projection.push(Projection::var(&vars.value));
        projection.push(Projection::var(&vars.unit));
        projection.push(Projection::var(&vars.normalized));
    }

    let mut query = SelectQuery::new().distinct().select(projection);
    for prefix in prefixes() {
        query = query.prefix(prefix);
    }

    query = query.pattern(document_pattern());
    for field in RESULT_FIELDS {
        if field != DocumentField::Title {
            query = query.pattern(document_field_pattern(field));
        }
    }

    for (quantity, range) in &parsed.parameters {
        query = query.patterns(measurement_patterns(*quantity));
        if let Some(condition) = range_filter(range) {
            query = query.filter(condition);
        }
    }

    if let Some(temporal) = parsed.temporal_constraint {
        query = query.filter(temporal_filter(temporal, options));
    }

    if let Some(condition) = keyword_filter(&parsed.keywords, options.match_abstract) {
        if options.match_abstract {
            query = query.pattern(document_field_pattern(DocumentField::Abstract));
        }
        query = query.filter(condition);
    }

    let newest_first =
        parsed.temporal_constraint.is_some() || options.order == ResultOrder::NewestFirst;
    let title = var(DocumentField::Title.var());
    let order = if newest_first {
        // Undated rows sort last under DESC; title keeps the order total.
        vec![
            OrderByExpr::desc(var(DocumentField::PublicationDate.var())),
            OrderByExpr::new(title),
        ]
    } else {
        vec![OrderByExpr::new(title)]
    };

    query.order_by(order).limit(options.effective_limit())
}
