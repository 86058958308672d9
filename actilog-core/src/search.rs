//! Translates an activity-log filter map into a SQL `FROM ... WHERE ...`
//! fragment with named bind parameters. The fragment deliberately stops
//! before any `SELECT` list or `ORDER BY` so the same query can back a
//! row fetch, a `COUNT(*)` and a paginated listing.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{FilterMap, Severity};

/// A value destined for a bind parameter. Filters only ever produce
/// integers and text, so the enum stays that small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

/// A SQL fragment starting at `FROM`, plus the values for every named
/// placeholder it mentions.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub fragment: String,
    pub params: BTreeMap<String, BindValue>,
}

impl SearchQuery {
    /// Placeholder names referenced by the fragment, in order of first
    /// appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        named_placeholders(&self.fragment)
    }
}

/// Scans a SQL string for `:name` placeholders. A colon not followed by
/// an identifier character is left alone, so casts or stray punctuation
/// do not register as parameters.
pub fn named_placeholders(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut names = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            if end > start {
                names.push(&sql[start..end]);
                i = end;
                continue;
            }
        }
        i += 1;
    }
    names
}

const BASE_FRAGMENT: &str = "FROM activity_system m";

struct Predicate {
    clause: &'static str,
    params: Vec<(&'static str, BindValue)>,
}

impl Predicate {
    fn bare(clause: &'static str) -> Self {
        Self {
            clause,
            params: Vec::new(),
        }
    }

    fn bound(clause: &'static str, name: &'static str, value: BindValue) -> Self {
        Self {
            clause,
            params: vec![(name, value)],
        }
    }
}

type PredicateRule = fn(&FilterMap) -> Option<Predicate>;

/// The filter rules in the order their clauses appear in the output.
/// Appending a rule here is the whole change needed for a new filter.
const RULES: [PredicateRule; 5] = [
    only_clients,
    only_staff,
    priority_equals,
    message_search,
    severity_floor,
];

/// Builds the search fragment for the activity table from an open filter
/// map. Unknown keys are ignored. With no recognized filters the result
/// is the bare `FROM activity_system m` and an empty parameter map.
pub fn build_search_query(filters: &FilterMap) -> SearchQuery {
    let mut clauses = Vec::new();
    let mut params = BTreeMap::new();
    for rule in RULES {
        if let Some(predicate) = rule(filters) {
            clauses.push(predicate.clause);
            for (name, value) in predicate.params {
                params.insert(name.to_string(), value);
            }
        }
    }

    let mut fragment = String::from(BASE_FRAGMENT);
    if !clauses.is_empty() {
        fragment.push_str(" WHERE ");
        fragment.push_str(&clauses.join(" AND "));
    }

    SearchQuery { fragment, params }
}

/// Restrict to rows attributed to a client account.
fn only_clients(filters: &FilterMap) -> Option<Predicate> {
    wants(filters.get("only_clients")).then(|| Predicate::bare("m.client_id IS NOT NULL"))
}

/// Restrict to rows attributed to a staff member.
fn only_staff(filters: &FilterMap) -> Option<Predicate> {
    wants(filters.get("only_staff")).then(|| Predicate::bare("m.admin_id IS NOT NULL"))
}

/// Exact severity match. Numbers and numeric strings bind as integers;
/// anything else binds as the text it came in as and matches nothing,
/// which mirrors how the database would compare it.
fn priority_equals(filters: &FilterMap) -> Option<Predicate> {
    let value = filters.get("priority").filter(|v| !v.is_null())?;
    Some(Predicate::bound(
        "m.priority = :priority",
        "priority",
        numeric_bind(value),
    ))
}

/// Substring match on the message, bound as `%term%`.
fn message_search(filters: &FilterMap) -> Option<Predicate> {
    let term = match filters.get("search") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    Some(Predicate::bound(
        "m.message LIKE :search",
        "search",
        BindValue::Text(format!("%{term}%")),
    ))
}

/// Cut off the noisiest severity levels. `no_info` hides Info and Debug,
/// `no_debug` hides Debug only; together the stricter floor wins. An
/// explicit `priority` filter suppresses the floor outright: both
/// clauses would bind `:priority`, and equality already pins the level.
fn severity_floor(filters: &FilterMap) -> Option<Predicate> {
    if filters.get("priority").is_some_and(|v| !v.is_null()) {
        return None;
    }
    let floor = if is_truthy(filters.get("no_info")) {
        Severity::Info
    } else if is_truthy(filters.get("no_debug")) {
        Severity::Debug
    } else {
        return None;
    };
    Some(Predicate::bound(
        "m.priority < :priority",
        "priority",
        BindValue::Int(floor.level()),
    ))
}

/// Opt-in flags accept boolean true or the literal string "yes".
fn wants(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "yes",
        _ => false,
    }
}

/// Loose truthiness for the noise-suppression flags: absent, null,
/// false, zero, "" and "0" are off, everything else is on.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn numeric_bind(value: &Value) -> BindValue {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => BindValue::Int(i),
            None => BindValue::Text(n.to_string()),
        },
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => BindValue::Int(i),
            Err(_) => BindValue::Text(s.clone()),
        },
        other => BindValue::Text(other.to_string()),
    }
}
