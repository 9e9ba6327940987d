// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter Translator
//!
//! Translates InstantSearch filter parameters to Typesense `filter_by` and
//! `facet_by` syntax.
//!
//! # Typesense Filter Syntax
//!
//! ```text
//! field:=[`a`,`b`]                 - Exact match, any of
//! field:[`a`,`b`]                  - Non-exact match, any of
//! field:!=[`a`]                    - Exact exclusion
//! field:![`a`]                     - Non-exact exclusion
//! field:=[10..20]                  - Inclusive numeric range
//! field:<=20                       - Numeric bound
//! geo:(x1, y1, x1, y2, x2, y2, x2, y1)  - Bounding box polygon
//! geo:(lat,lng, 5 km)              - Radius around point
//! clause1 && clause2               - AND
//! (clause1 || clause2)             - OR (facet filter groups)
//! ```

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::request::{AroundRadius, FacetFilter, SearchParams};

use super::field_tokenizer::{FacetToken, FieldTokenizer, NumericOperator};

const AND: &str = " && ";
const OR: &str = " || ";

/// Typesense filter translator, bound to one configuration.
pub struct FilterTranslator<'a> {
    config: &'a AdapterConfig,
    tokenizer: FieldTokenizer<'a>,
}

/// Bounds collected for one numeric field, last occurrence wins per operator.
#[derive(Default)]
struct NumericBounds<'t> {
    lte: Option<&'t str>,
    gte: Option<&'t str>,
    lt: Option<&'t str>,
    gt: Option<&'t str>,
    eq: Option<&'t str>,
    ne: Option<&'t str>,
}

impl<'t> NumericBounds<'t> {
    fn set(&mut self, op: NumericOperator, value: &'t str) {
        let slot = match op {
            NumericOperator::Lte => &mut self.lte,
            NumericOperator::Gte => &mut self.gte,
            NumericOperator::Lt => &mut self.lt,
            NumericOperator::Gt => &mut self.gt,
            NumericOperator::Eq => &mut self.eq,
            NumericOperator::Ne => &mut self.ne,
        };
        *slot = Some(value);
    }

    fn render(&self, field: &str, out: &mut Vec<String>) {
        match (self.gte, self.lte) {
            (Some(lower), Some(upper)) => out.push(format!("{}:=[{}..{}]", field, lower, upper)),
            (lower, upper) => {
                if let Some(upper) = upper {
                    out.push(format!("{}:<={}", field, upper));
                }
                if let Some(lower) = lower {
                    out.push(format!("{}:>={}", field, lower));
                }
            }
        }
        let rest = [
            (NumericOperator::Lt, self.lt),
            (NumericOperator::Gt, self.gt),
            (NumericOperator::Eq, self.eq),
            (NumericOperator::Ne, self.ne),
        ];
        for (op, value) in rest {
            if let Some(value) = value {
                out.push(format!("{}:{}{}", field, op.as_str(), value));
            }
        }
    }
}

impl<'a> FilterTranslator<'a> {
    pub fn new(config: &'a AdapterConfig) -> Self {
        Self {
            config,
            tokenizer: FieldTokenizer::new(&config.facetable_fields_with_special_characters),
        }
    }

    /// Full `filter_by` for a request: facet, numeric and geo filters.
    pub fn filter_by(&self, params: &SearchParams, collection: Option<&str>) -> Result<String> {
        let mut parts = Vec::with_capacity(3);

        if let Some(facet_filters) = &params.facet_filters {
            parts.push(self.facet_filters(facet_filters, collection)?);
        }
        if let Some(numeric_filters) = &params.numeric_filters {
            parts.push(self.numeric_filters(numeric_filters)?);
        }
        if let Some(geo) = self.geo_filter(params)? {
            parts.push(geo);
        }

        parts.retain(|p| !p.is_empty());
        Ok(parts.join(AND))
    }

    /// `["f<=634", "f>=289", "g<=5"]` → `f:=[289..634] && g:<=5`
    pub fn numeric_filters(&self, filters: &[String]) -> Result<String> {
        let mut fields: Vec<(&str, NumericBounds<'_>)> = Vec::new();

        for filter in filters {
            let token = self.tokenizer.split_numeric(filter)?;
            match fields.iter_mut().find(|(field, _)| *field == token.field) {
                Some((_, bounds)) => bounds.set(token.operator, token.value),
                None => {
                    let mut bounds = NumericBounds::default();
                    bounds.set(token.operator, token.value);
                    fields.push((token.field, bounds));
                }
            }
        }

        let mut terms = Vec::with_capacity(fields.len());
        for (field, bounds) in &fields {
            bounds.render(field, &mut terms);
        }
        Ok(terms.join(AND))
    }

    /// `[["f:a", "f:b"], "g:-c"]` → ``f:=[`a`,`b`] && g:!=[`c`]``
    pub fn facet_filters(&self, filters: &[FacetFilter], collection: Option<&str>) -> Result<String> {
        let mut clauses = Vec::with_capacity(filters.len());

        for filter in filters {
            match filter {
                FacetFilter::Single(token) => {
                    let token = self.tokenizer.split_facet(token)?;
                    clauses.push(self.facet_clause(token.field, token.negated, &[token.value], collection));
                }
                FacetFilter::Group(tokens) => {
                    if let Some(clause) = self.facet_group(tokens, collection)? {
                        clauses.push(clause);
                    }
                }
            }
        }

        Ok(clauses.join(AND))
    }

    fn facet_group(&self, tokens: &[String], collection: Option<&str>) -> Result<Option<String>> {
        // (field, negated) → values, in first-occurrence order
        let mut groups: Vec<((&str, bool), Vec<&str>)> = Vec::new();

        for raw in tokens {
            let FacetToken { field, value, negated } = self.tokenizer.split_facet(raw)?;
            match groups.iter_mut().find(|(key, _)| *key == (field, negated)) {
                Some((_, values)) => values.push(value),
                None => groups.push(((field, negated), vec![value])),
            }
        }

        let parts: Vec<String> = groups
            .iter()
            .map(|((field, negated), values)| self.facet_clause(field, *negated, values, collection))
            .collect();

        Ok(match parts.len() {
            0 => None,
            1 => parts.into_iter().next(),
            _ => Some(format!("({})", parts.join(OR))),
        })
    }

    fn facet_clause(&self, field: &str, negated: bool, values: &[&str], collection: Option<&str>) -> String {
        let operator = match (self.config.exact_match(collection, field), negated) {
            (true, false) => "=",
            (false, false) => "",
            (true, true) => "!=",
            (false, true) => "!",
        };
        let quoted: Vec<String> = values.iter().map(|v| format!("`{}`", v)).collect();
        format!("{}:{}[{}]", field, operator, quoted.join(","))
    }

    /// `["brand", "price"]` → `brand(sort_by: _alpha:asc),price`
    pub fn facet_by(&self, facets: &[String], collection: Option<&str>) -> String {
        facets
            .iter()
            .map(|field| match self.config.facet_by_directive(collection, field) {
                Some(directive) => format!("{}{}", field, directive),
                None => field.clone(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Geo filter against the configured geo field, if any geo parameter is set.
    ///
    /// Precedence: bounding box, then around-point, then polygon.
    pub fn geo_filter(&self, params: &SearchParams) -> Result<Option<String>> {
        let field = &self.config.geo_location_field;

        if let Some(bbox) = &params.inside_bounding_box {
            let coords = bbox.to_list();
            reject_blank("insideBoundingBox", &coords)?;
            let [x1, y1, x2, y2] = coords.as_slice() else {
                return Err(AdapterError::InvalidGeoFilter(format!(
                    "insideBoundingBox needs 4 coordinates, got {}",
                    coords.len()
                )));
            };
            return Ok(Some(format!(
                "{}:({}, {}, {}, {}, {}, {}, {}, {})",
                field, x1, y1, x1, y2, x2, y2, x2, y1
            )));
        }

        if let Some(lat_lng) = &params.around_lat_lng {
            let meters = params
                .around_radius
                .as_ref()
                .and_then(AroundRadius::meters)
                .ok_or_else(|| {
                    AdapterError::InvalidGeoFilter(
                        "filtering around a lat/lng also requires a numerical radius".to_string(),
                    )
                })?;

            let point: Vec<&str> = lat_lng.split(',').map(str::trim).collect();
            let [lat, lng] = point.as_slice() else {
                return Err(AdapterError::InvalidGeoFilter(format!(
                    "aroundLatLng must be 'lat,lng', got '{}'",
                    lat_lng
                )));
            };
            if lat.is_empty() || lng.is_empty() {
                return Err(AdapterError::InvalidGeoFilter(format!(
                    "aroundLatLng must be 'lat,lng', got '{}'",
                    lat_lng
                )));
            }

            return Ok(Some(format!("{}:({},{}, {} km)", field, lat, lng, meters / 1000.0)));
        }

        if let Some(polygon) = &params.inside_polygon {
            let coords = polygon.to_list();
            reject_blank("insidePolygon", &coords)?;
            if coords.len() < 6 || coords.len() % 2 != 0 {
                return Err(AdapterError::InvalidGeoFilter(format!(
                    "insidePolygon needs at least 3 points as coordinate pairs, got {} coordinates",
                    coords.len()
                )));
            }
            return Ok(Some(format!("{}:({})", field, coords.join(","))));
        }

        Ok(None)
    }

    /// Rule contexts become Typesense override tags.
    pub fn override_tags(rule_contexts: &[String]) -> String {
        rule_contexts.join(",")
    }
}

fn reject_blank(param: &str, coords: &[String]) -> Result<()> {
    if coords.iter().any(String::is_empty) {
        return Err(AdapterError::InvalidGeoFilter(format!(
            "{} has an empty coordinate",
            param
        )));
    }
    Ok(())
}
