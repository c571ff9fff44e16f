use std::collections::{BTreeMap, BTreeSet};

use rdsdata_api::Value;

use crate::error::ClientError;

pub const ERROR_NUMBER_OF_PARAMS_MISMATCH: &str =
    "Number of placeholders does not match number of parameters";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Names of all `:name` placeholders in `sql`.
///
/// String literals and comments are not skipped.
pub fn find_named(sql: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut rest = sql;
    while let Some(pos) = rest.find(':') {
        let after = &rest[pos + 1..];
        let len = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
        if len > 0 {
            names.insert(after[..len].to_string());
        }
        rest = &after[len..];
    }
    names
}

/// Rewrites each positional `?` as `:1`, `:2`, ... and binds `params` under
/// those names, in order.
pub fn convert_to_named(
    sql: &str,
    params: Vec<Value>,
) -> Result<(String, BTreeMap<String, Value>), ClientError> {
    let count = sql.matches('?').count();
    if count != params.len() {
        return Err(ClientError::argument(ERROR_NUMBER_OF_PARAMS_MISMATCH));
    }

    let mut rewritten = String::with_capacity(sql.len() + count * 2);
    let mut index = 0;
    for c in sql.chars() {
        if c == '?' {
            index += 1;
            rewritten.push(':');
            rewritten.push_str(&index.to_string());
        } else {
            rewritten.push(c);
        }
    }

    let bound = params
        .into_iter()
        .enumerate()
        .map(|(i, value)| ((i + 1).to_string(), value))
        .collect();
    Ok((rewritten, bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_distinct_names() {
        let sql = "SELECT * FROM t WHERE a = :a AND b = :b_2 OR a = :a";
        assert_eq!(find_named(sql), set(&["a", "b_2"]));
    }

    #[test]
    fn bare_colons_are_not_placeholders() {
        assert_eq!(find_named("SELECT ':' , x::int FROM t"), set(&["int"]));
        assert!(find_named("SELECT 1").is_empty());
        assert_eq!(find_named(":end"), set(&["end"]));
    }

    #[test]
    fn rewrites_positional_placeholders() {
        let (sql, params) =
            convert_to_named("INSERT INTO t VALUES (?, ?)", vec![Value::from(1i32), Value::from("x")])
                .unwrap();
        assert_eq!(sql, "INSERT INTO t VALUES (:1, :2)");
        assert_eq!(params["1"], Value::Int32(1));
        assert_eq!(params["2"], Value::String("x".into()));
    }

    #[test]
    fn trailing_placeholder_is_counted() {
        let (sql, params) = convert_to_named("SELECT * FROM t WHERE id = ?", vec![Value::Null]).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id = :1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn count_mismatch_is_an_argument_error() {
        let err = convert_to_named("SELECT ?", Vec::new()).unwrap_err();
        assert!(matches!(err, ClientError::Argument(ref m) if m == ERROR_NUMBER_OF_PARAMS_MISMATCH));
        assert!(convert_to_named("SELECT 1", vec![Value::Null]).is_err());
    }
}
