//! Conjunctive document filters evaluated identically by every backend.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Some element of the array at the field satisfies every condition.
    ElemMatch(String, Vec<Condition>),
}

impl Condition {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Eq(field, expected) => lookup(doc, field).is_some_and(|v| v == expected),
            Self::Gte(field, bound) => lookup(doc, field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o != Ordering::Less),
            Self::Lte(field, bound) => lookup(doc, field)
                .and_then(|v| compare_values(v, bound))
                .is_some_and(|o| o != Ordering::Greater),
            Self::ElemMatch(field, conditions) => lookup(doc, field)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| conditions.iter().all(|c| c.matches(item)))
                }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Gte(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Lte(field.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn elem_match(mut self, field: &str, conditions: Vec<Condition>) -> Self {
        self.conditions
            .push(Condition::ElemMatch(field.to_string(), conditions));
        self
    }

    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }

    /// Stable ordering; documents missing the field sort first, ties break by `_id`.
    pub fn apply(&self, docs: &mut [Value]) {
        docs.sort_by(|a, b| {
            let primary = match (lookup(a, &self.field), lookup(b, &self.field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let primary = if self.descending {
                primary.reverse()
            } else {
                primary
            };
            primary.then_with(|| {
                let ia = a.get("_id").and_then(Value::as_str).unwrap_or_default();
                let ib = b.get("_id").and_then(Value::as_str).unwrap_or_default();
                ia.cmp(ib)
            })
        });
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Numbers compare numerically; strings that are both RFC 3339 timestamps
/// compare chronologically, other strings lexically. Mixed kinds are unordered.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
