//! sqlx's sqlite driver only takes positional `?` placeholders, so the
//! named `:name` parameters carried by a search fragment are rewritten
//! here before execution.

use std::collections::BTreeMap;

use actilog_core::{ActilogError, BindValue, Result};

#[derive(Debug)]
pub struct ExpandedQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Rewrites each `:name` placeholder to `?` and lines the bound values
/// up in occurrence order. A name appearing twice binds its value twice.
/// The scan is quote-naive, which holds for the fragments the search
/// builder produces; they carry no string literals.
pub fn expand_named_params(
    sql: &str,
    params: &BTreeMap<String, BindValue>,
) -> Result<ExpandedQuery> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut binds = Vec::new();
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            if end > start {
                let name = &sql[start..end];
                let value = params.get(name).ok_or_else(|| {
                    ActilogError::Validation(format!("no bound parameter for placeholder :{name}"))
                })?;
                out.push_str(&sql[copied..i]);
                out.push('?');
                binds.push(value.clone());
                copied = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&sql[copied..]);
    Ok(ExpandedQuery { sql: out, binds })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, BindValue)]) -> BTreeMap<String, BindValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn passthrough_without_placeholders() {
        let expanded = expand_named_params("SELECT 1", &BTreeMap::new()).unwrap();
        assert_eq!(expanded.sql, "SELECT 1");
        assert!(expanded.binds.is_empty());
    }

    #[test]
    fn rewrites_to_positional() {
        let expanded = expand_named_params(
            "FROM activity_system m WHERE m.priority = :priority",
            &params(&[("priority", BindValue::Int(2))]),
        )
        .unwrap();
        assert_eq!(expanded.sql, "FROM activity_system m WHERE m.priority = ?");
        assert_eq!(expanded.binds, vec![BindValue::Int(2)]);
    }

    #[test]
    fn repeated_name_binds_twice() {
        let expanded = expand_named_params(
            "WHERE a = :x OR b = :x",
            &params(&[("x", BindValue::Int(1))]),
        )
        .unwrap();
        assert_eq!(expanded.sql, "WHERE a = ? OR b = ?");
        assert_eq!(expanded.binds, vec![BindValue::Int(1), BindValue::Int(1)]);
    }

    #[test]
    fn binds_follow_occurrence_order() {
        let expanded = expand_named_params(
            "WHERE m.message LIKE :search AND m.priority = :priority",
            &params(&[
                ("priority", BindValue::Int(6)),
                ("search", BindValue::Text("%x%".to_string())),
            ]),
        )
        .unwrap();
        assert_eq!(
            expanded.binds,
            vec![BindValue::Text("%x%".to_string()), BindValue::Int(6)]
        );
    }

    #[test]
    fn unbound_placeholder_errors() {
        let err = expand_named_params("WHERE a = :missing", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains(":missing"));
    }

    #[test]
    fn bare_colon_is_left_alone() {
        let expanded = expand_named_params("SELECT 1 WHERE ': ' = ': '", &BTreeMap::new()).unwrap();
        assert_eq!(expanded.sql, "SELECT 1 WHERE ': ' = ': '");
    }
}
