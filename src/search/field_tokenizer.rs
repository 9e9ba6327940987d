// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field Tokenizer
//!
//! Splits InstantSearch filter tokens into field name and value.
//!
//! Field names may themselves contain colons (`field:with:colons:value`) or
//! numeric-operator characters (`field>weird=name<=3`). The ambiguity is
//! resolved with a side-table of known multi-part field names:
//!
//! ```text
//! facet:    known field `name` + ":" + value   →  (name, value)
//!           otherwise split at the LAST colon
//! numeric:  known field `name` + op + number   →  (name, op, number)
//!           otherwise split at the FIRST operator
//! ```

use crate::error::{AdapterError, Result};

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericOperator {
    Lte,
    Gte,
    Lt,
    Gt,
    Eq,
    Ne,
}

impl NumericOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }

    /// Operator at the start of `s`, longest match first.
    fn parse_prefix(s: &str) -> Option<Self> {
        const OPERATORS: [NumericOperator; 6] = [
            NumericOperator::Lte,
            NumericOperator::Gte,
            NumericOperator::Ne,
            NumericOperator::Lt,
            NumericOperator::Gt,
            NumericOperator::Eq,
        ];
        OPERATORS.into_iter().find(|op| s.starts_with(op.as_str()))
    }
}

/// `field<op>value`
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken<'a> {
    pub field: &'a str,
    pub operator: NumericOperator,
    pub value: &'a str,
}

/// `field:value` or `field:-value`
#[derive(Debug, Clone, PartialEq)]
pub struct FacetToken<'a> {
    pub field: &'a str,
    pub value: &'a str,
    pub negated: bool,
}

/// Tokenizer over the configured special-character field names.
#[derive(Debug, Clone)]
pub struct FieldTokenizer<'a> {
    /// Longest first, so `a:b:c` wins over `a:b`
    special_fields: Vec<&'a str>,
}

impl<'a> FieldTokenizer<'a> {
    pub fn new(special_fields: &'a [String]) -> Self {
        let mut fields: Vec<&str> = special_fields.iter().map(String::as_str).collect();
        fields.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            special_fields: fields,
        }
    }

    pub fn is_special(&self, field: &str) -> bool {
        self.special_fields.contains(&field)
    }

    pub fn split_numeric<'t>(&self, token: &'t str) -> Result<NumericToken<'t>> {
        let (field, operator, rest) = self
            .split_special_numeric(token)
            .or_else(|| Self::split_first_operator(token))
            .ok_or_else(|| AdapterError::numeric(token, "no comparison operator"))?;

        if field.is_empty() {
            return Err(AdapterError::numeric(token, "empty field name"));
        }

        let value = rest.trim();
        if value.parse::<f64>().is_err() {
            return Err(AdapterError::numeric(token, format!("'{}' is not a number", value)));
        }

        Ok(NumericToken {
            field,
            operator,
            value,
        })
    }

    pub fn split_facet<'t>(&self, token: &'t str) -> Result<FacetToken<'t>> {
        let (field, raw_value) = match self.split_special_facet(token) {
            Some(split) => split,
            None => {
                let idx = token
                    .rfind(':')
                    .ok_or_else(|| AdapterError::facet(token, "missing ':' separator"))?;
                (&token[..idx], &token[idx + 1..])
            }
        };

        if field.is_empty() {
            return Err(AdapterError::facet(token, "empty field name"));
        }

        let (value, negated) = match raw_value.strip_prefix('-') {
            Some(stripped) => (stripped, true),
            None => (raw_value, false),
        };

        Ok(FacetToken {
            field,
            value,
            negated,
        })
    }

    fn split_special_numeric<'t>(&self, token: &'t str) -> Option<(&'t str, NumericOperator, &'t str)> {
        self.special_fields.iter().find_map(|name| {
            let rest = token.strip_prefix(*name)?;
            let op = NumericOperator::parse_prefix(rest)?;
            Some((&token[..name.len()], op, &rest[op.as_str().len()..]))
        })
    }

    fn split_first_operator(token: &str) -> Option<(&str, NumericOperator, &str)> {
        token.char_indices().find_map(|(idx, c)| {
            if !matches!(c, '<' | '>' | '=' | '!') {
                return None;
            }
            let op = NumericOperator::parse_prefix(&token[idx..])?;
            Some((&token[..idx], op, &token[idx + op.as_str().len()..]))
        })
    }

    fn split_special_facet<'t>(&self, token: &'t str) -> Option<(&'t str, &'t str)> {
        self.special_fields.iter().find_map(|name| {
            let value = token.strip_prefix(*name)?.strip_prefix(':')?;
            Some((&token[..name.len()], value))
        })
    }
}
