//! Structural filter, sort and paging descriptors.
//!
//! A [`RecordFilter`] is always an AND-combination: the ownership scope, the
//! optional id and every field clause must all admit a record. Repositories
//! may push parts of it into their query language but must preserve that
//! meaning exactly.

use salesdesk_types::{RecordId, UserId};
use serde_json::Value;
use std::cmp::Ordering;

/// Ownership restriction applied to a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OwnerScope {
    /// No restriction: every owner's records are visible.
    #[default]
    Unrestricted,
    /// Only records owned by this user.
    Owner(UserId),
}

impl OwnerScope {
    pub fn admits(&self, owner: Option<&UserId>) -> bool {
        match self {
            OwnerScope::Unrestricted => true,
            OwnerScope::Owner(user) => owner == Some(user),
        }
    }

    pub fn owner(&self) -> Option<&UserId> {
        match self {
            OwnerScope::Unrestricted => None,
            OwnerScope::Owner(user) => Some(user),
        }
    }
}

/// A single predicate over a record's serialized fields.
///
/// Field names may be given as bare names (`"status"`) or JSON pointers
/// (`"/address/city"`).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldClause {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    /// Case-insensitive substring match against any of the fields.
    Search { fields: Vec<String>, needle: String },
    /// Inclusive bounds. Numbers compare numerically, strings lexicographically
    /// (ISO dates therefore compare chronologically).
    Range {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },
    IsNull { field: String },
}

impl FieldClause {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldClause::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        FieldClause::In {
            field: field.into(),
            values,
        }
    }

    pub fn search(fields: &[&str], needle: impl Into<String>) -> Self {
        FieldClause::Search {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            needle: needle.into(),
        }
    }

    pub fn range(field: impl Into<String>, min: Option<Value>, max: Option<Value>) -> Self {
        FieldClause::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        FieldClause::IsNull {
            field: field.into(),
        }
    }

    /// Evaluate the clause against a serialized record.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            FieldClause::Eq { field, value } => {
                lookup(doc, field).is_some_and(|actual| values_equal(actual, value))
            }
            FieldClause::In { field, values } => lookup(doc, field)
                .is_some_and(|actual| values.iter().any(|v| values_equal(actual, v))),
            FieldClause::Search { fields, needle } => {
                let needle = needle.trim().to_lowercase();
                if needle.is_empty() {
                    return true;
                }
                fields.iter().any(|f| match lookup(doc, f) {
                    Some(Value::String(s)) => s.to_lowercase().contains(&needle),
                    _ => false,
                })
            }
            FieldClause::Range { field, min, max } => {
                let Some(actual) = lookup(doc, field).filter(|v| !v.is_null()) else {
                    return false;
                };
                let above_min = min.as_ref().is_none_or(|m| {
                    matches!(compare_values(actual, m), Some(Ordering::Greater | Ordering::Equal))
                });
                let below_max = max.as_ref().is_none_or(|m| {
                    matches!(compare_values(actual, m), Some(Ordering::Less | Ordering::Equal))
                });
                above_min && below_max
            }
            FieldClause::IsNull { field } => lookup(doc, field).is_none_or(Value::is_null),
        }
    }
}

/// Complete row selection for a repository query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordFilter {
    pub owner: OwnerScope,
    pub id: Option<RecordId>,
    pub clauses: Vec<FieldClause>,
}

impl RecordFilter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn scoped(owner: OwnerScope) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    /// Plain lookup by id, without any ownership restriction.
    pub fn by_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_clause(mut self, clause: FieldClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn with_clauses(mut self, clauses: impl IntoIterator<Item = FieldClause>) -> Self {
        self.clauses.extend(clauses);
        self
    }

    /// Whether a stored record satisfies every part of the filter.
    pub fn admits(&self, id: &RecordId, owner: Option<&UserId>, doc: &Value) -> bool {
        if self.id.as_ref().is_some_and(|wanted| wanted != id) {
            return false;
        }
        self.owner.admits(owner) && self.clauses.iter().all(|c| c.matches(doc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering for `find_many`. Records missing the field always sort last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Sort `(id, document)` pairs in place. Ties fall back to the id in the
    /// same direction, which keeps UUIDv7 ids in creation order.
    pub fn apply<T>(&self, rows: &mut [(T, Value)], id_of: impl Fn(&T) -> &str) {
        rows.sort_by(|(a, da), (b, db)| {
            let va = lookup(da, &self.field).filter(|v| !v.is_null());
            let vb = lookup(db, &self.field).filter(|v| !v.is_null());
            let ord = match (va, vb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            };
            let ord = ord.then_with(|| id_of(a).cmp(id_of(b)));
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

/// Offset/limit window applied after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    if field.starts_with('/') {
        doc.pointer(field)
    } else {
        doc.get(field)
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => a.as_f64() == e.as_f64(),
        // Query-string filters arrive as strings; coerce scalars for comparison
        (Value::Number(n), Value::String(e)) => n.to_string() == *e,
        (Value::Bool(b), Value::String(e)) => b.to_string() == *e,
        _ => actual == expected,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
