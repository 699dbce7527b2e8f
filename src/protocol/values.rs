//! Value normalization against the feature catalog.
//!
//! Devices report values as `{uid, value}` records. Normalization turns each
//! record into `display name -> value`, replacing enumerated raw values with
//! their labels.

use serde_json::{Map, Value};

use crate::catalog::{json_to_key, FeatureCatalog, FeatureId};
use crate::error::{HcError, Result};

/// Normalized values: display name (or raw uid) -> resolved value
pub type Values = Map<String, Value>;

/// Normalize a batch of value records.
///
/// Without a catalog (or with an empty one) records pass through keyed by
/// uid and nothing is rejected. With a catalog every record needs `uid` and
/// `value`; uids the catalog does not know are keyed by their raw id.
pub fn normalize(catalog: Option<&FeatureCatalog>, records: &[Value]) -> Result<Values> {
    let Some(catalog) = catalog.filter(|c| !c.is_empty()) else {
        return Ok(passthrough(records));
    };

    let mut result = Values::new();

    for record in records {
        let (uid, value) = split_record(record)?;
        let id = FeatureId::from_json(uid);

        let Some(desc) = catalog.get(id.as_str()) else {
            result.insert(id.to_string(), value.clone());
            continue;
        };

        let resolved = match desc.label(&json_to_key(value)) {
            Some(label) => Value::String(label.to_string()),
            None => value.clone(),
        };
        result.insert(desc.display_name().to_string(), resolved);
    }

    Ok(result)
}

/// Key each record by its uid, or by its position when it has none.
///
/// A plain `{uid, value}` record collapses to its value; any other record is
/// kept whole.
fn passthrough(records: &[Value]) -> Values {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let key = record
                .get("uid")
                .map_or_else(|| index.to_string(), |uid| FeatureId::from_json(uid).to_string());
            let plain = record.as_object().is_some_and(|fields| fields.len() == 2);
            let value = match record.get("value") {
                Some(value) if plain && record.get("uid").is_some() => value.clone(),
                _ => record.clone(),
            };
            (key, value)
        })
        .collect()
}

fn split_record(record: &Value) -> Result<(&Value, &Value)> {
    let uid = record
        .get("uid")
        .ok_or_else(|| HcError::MalformedMessage(format!("value record without uid: {record}")))?;
    let value = record
        .get("value")
        .ok_or_else(|| HcError::MalformedMessage(format!("value record without value: {record}")))?;
    Ok((uid, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Access, FeatureDescriptor};
    use serde_json::json;

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new()
            .with_feature(
                539,
                FeatureDescriptor::new("BSH.Common.Setting.PowerState")
                    .with_access(Access::ReadWrite)
                    .with_value("0", "Off")
                    .with_value("1", "On"),
            )
            .with_feature(
                544,
                FeatureDescriptor::new("BSH.Common.Option.RemainingProgramTime"),
            )
    }

    #[test]
    fn test_enumerated_value_gets_label() {
        let catalog = catalog();
        let values = normalize(Some(&catalog), &[json!({"uid": 539, "value": 1})]).unwrap();
        assert_eq!(values["PowerState"], json!("On"));
    }

    #[test]
    fn test_unmatched_value_passes_through() {
        let catalog = catalog();
        let values = normalize(
            Some(&catalog),
            &[
                json!({"uid": 539, "value": 7}),
                json!({"uid": 544, "value": 3600}),
            ],
        )
        .unwrap();
        assert_eq!(values["PowerState"], json!(7));
        assert_eq!(values["RemainingProgramTime"], json!(3600));
    }

    #[test]
    fn test_unknown_uid_keeps_raw_id() {
        let catalog = catalog();
        let values = normalize(Some(&catalog), &[json!({"uid": 12, "value": true})]).unwrap();
        assert_eq!(values["12"], json!(true));
    }

    #[test]
    fn test_no_catalog_is_passthrough() {
        let values = normalize(None, &[json!({"uid": 539, "value": 1})]).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["539"], json!(1));
    }

    #[test]
    fn test_no_catalog_keeps_incomplete_records() {
        let records = [
            json!({"uid": 539, "value": 1, "extra": "kept"}),
            json!({"uid": 540}),
            json!({"state": "idle"}),
        ];
        let values = normalize(None, &records).unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values["539"], records[0]);
        assert_eq!(values["540"], json!({"uid": 540}));
        assert_eq!(values["2"], json!({"state": "idle"}));
    }

    #[test]
    fn test_empty_catalog_is_passthrough() {
        let empty = FeatureCatalog::new();
        let values = normalize(Some(&empty), &[json!({"uid": 540})]).unwrap();
        assert_eq!(values["540"], json!({"uid": 540}));
    }

    #[test]
    fn test_record_without_value_is_malformed() {
        let catalog = catalog();
        let err = normalize(Some(&catalog), &[json!({"uid": 539})]).unwrap_err();
        assert!(matches!(err, HcError::MalformedMessage(_)));
    }
}
