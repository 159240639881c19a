use std::fmt;

use serde_json::{Map, Value};

use crate::{
    error::{KeyPath, SchemaShapeError, ValidationError, ValidationErrorKind},
    schema::node::{MapNode, SchemaNode, value_kind},
};

/// Outcome of validating one record: every defect found, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// True when no defect was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// All defects.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of defects.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the defects.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    fn push(&mut self, path: KeyPath, kind: ValidationErrorKind) {
        self.errors.push(ValidationError { path, kind });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("ok");
        }
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Validate `candidate` against the schema in its data form.
///
/// Fails only when the schema itself is malformed; record defects are
/// collected in the returned report.
pub fn validate(schema: &Value, candidate: &Value) -> Result<ValidationReport, SchemaShapeError> {
    let schema = SchemaNode::from_value(schema)?;
    Ok(schema.validate_record(candidate))
}

impl SchemaNode {
    /// Validate `candidate` against this parsed schema.
    pub fn validate_record(&self, candidate: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();
        check(self, candidate, &KeyPath::root(), &mut report);
        report
    }
}

fn check(node: &SchemaNode, value: &Value, path: &KeyPath, report: &mut ValidationReport) {
    match node {
        SchemaNode::Leaf(tag) => {
            if !tag.accepts(value) {
                report.push(
                    path.clone(),
                    ValidationErrorKind::TypeMismatch {
                        expected: tag.to_string(),
                        actual: value_kind(value).to_string(),
                    },
                );
            }
        }
        SchemaNode::Map(map) => match value {
            Value::Object(record) => check_map(map, record, path, report),
            other => report.push(
                path.clone(),
                ValidationErrorKind::TypeMismatch {
                    expected: "mapping".to_string(),
                    actual: value_kind(other).to_string(),
                },
            ),
        },
    }
}

fn check_map(
    node: &MapNode,
    record: &Map<String, Value>,
    path: &KeyPath,
    report: &mut ValidationReport,
) {
    for (key, child) in &node.fields {
        let child_path = path.child(key);
        match record.get(key) {
            Some(value) => check(child, value, &child_path, report),
            None => report.push(child_path, ValidationErrorKind::MissingKey),
        }
    }

    for (key, value) in record {
        if node.fields.contains_key(key) {
            continue;
        }
        let child_path = path.child(key);
        match &node.extra {
            Some(extra) => check(extra, value, &child_path, report),
            None => report.push(child_path, ValidationErrorKind::UnknownKey),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn net_schema() -> Value {
        json!({"net": {"ip": "str", "port": "int"}})
    }

    #[test]
    fn test_port_as_string_is_rejected() {
        let report = validate(&net_schema(), &json!({"net": {"ip": "10.0.0.1", "port": "80"}}))
            .unwrap();
        assert_eq!(report.len(), 1);
        let err = &report.errors()[0];
        assert_eq!(err.path.to_string(), "net.port");
        assert_eq!(
            err.kind,
            ValidationErrorKind::TypeMismatch {
                expected: "int".to_string(),
                actual: "string".to_string()
            }
        );
    }

    #[test]
    fn test_valid_record() {
        let report =
            validate(&net_schema(), &json!({"net": {"ip": "10.0.0.1", "port": 80}})).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.to_string(), "ok");
    }

    #[test]
    fn test_collects_every_defect() {
        let schema = json!({
            "net": {"ip": "str", "port": "int", "dns": {"servers": "list"}},
            "hostname": "str"
        });
        let candidate = json!({
            "net": {"port": true, "dns": "8.8.8.8", "mtu": 1500},
            "extra": 1
        });
        let report = validate(&schema, &candidate).unwrap();
        let rendered: Vec<String> = report.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "missing key `hostname`",
                "type mismatch at `net.dns`: expected mapping, found string",
                "missing key `net.ip`",
                "type mismatch at `net.port`: expected int, found bool",
                "unknown key `net.mtu`",
                "unknown key `extra`",
            ]
        );
    }

    #[test]
    fn test_one_unknown_key_per_extra_path() {
        let report = validate(
            &net_schema(),
            &json!({"net": {"ip": "a", "port": 1, "x": {"deep": 1}}, "y": null}),
        )
        .unwrap();
        let unknown: Vec<String> = report
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::UnknownKey)
            .map(|e| e.path.to_string())
            .collect();
        assert_eq!(unknown, vec!["net.x", "y"]);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_open_node_checks_extra_keys() {
        let schema = json!({"repos": {"base": "str", "*": "str"}});
        let report = validate(
            &schema,
            &json!({"repos": {"base": "http://a", "epel": "http://b", "bad": 3}}),
        )
        .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors()[0].path.to_string(), "repos.bad");
    }

    #[test]
    fn test_nullable_and_any() {
        let schema = json!({"gw": "str?", "meta": "any"});
        assert!(validate(&schema, &json!({"gw": null, "meta": {"k": [1]}})).unwrap().is_ok());
        // A nullable key still has to be present.
        let report = validate(&schema, &json!({"meta": 1})).unwrap();
        assert_eq!(report.errors()[0].kind, ValidationErrorKind::MissingKey);
    }

    #[test]
    fn test_candidate_root_not_mapping() {
        let report = validate(&net_schema(), &json!([1, 2])).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.errors()[0].path.is_root());
    }

    #[test]
    fn test_malformed_schema_is_fatal() {
        assert!(validate(&json!("str"), &json!({})).is_err());
        assert!(validate(&json!({"a": [1]}), &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_idempotent_and_non_mutating() {
        let schema = net_schema();
        let candidate = json!({"net": {"ip": 1}});
        let before = candidate.clone();
        let first = validate(&schema, &candidate).unwrap();
        let second = validate(&schema, &candidate).unwrap();
        assert_eq!(first, second);
        assert_eq!(candidate, before);
    }

    #[test]
    fn test_soundness_for_valid_record() {
        let schema = json!({"a": {"b": {"c": "int", "d": "list"}, "e": "bool"}});
        let record = json!({"a": {"b": {"c": 3, "d": []}, "e": false}});
        let parsed = SchemaNode::from_value(&schema).unwrap();
        assert!(parsed.validate_record(&record).is_ok());
        for path in ["a.b.c", "a.b.d", "a.e"] {
            let key = KeyPath::from(path);
            let mut value = &record;
            for seg in key.segments() {
                value = &value[seg.as_str()];
            }
            let SchemaNode::Leaf(tag) = parsed.get(&key).unwrap() else {
                panic!("expected a leaf at {path}");
            };
            assert!(tag.accepts(value));
        }
    }
}
