//! Write validation against the feature catalog.
//!
//! Mutating POSTs to `/ro/values` and `/ro/activeProgram` are checked record
//! by record before they are encoded. The first violation aborts the whole
//! batch and nothing is sent.

use serde_json::Value;

use super::message::Action;
use super::resource::Resource;
use crate::catalog::{FeatureCatalog, FeatureDescriptor, FeatureId};
use crate::error::ValidationError;

/// Which rule set applies to an outbound request, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Feature value writes (`POST /ro/values`)
    Values,
    /// Program activation (`POST /ro/activeProgram`)
    ActiveProgram,
}

impl WriteKind {
    /// Classify a request
    pub fn of(action: Action, resource: &str) -> Option<Self> {
        if action != Action::Post {
            return None;
        }
        match Resource::from_path(resource)? {
            Resource::Values => Some(WriteKind::Values),
            Resource::ActiveProgram => Some(WriteKind::ActiveProgram),
            _ => None,
        }
    }
}

/// Validate a request's records if it is a mutating write.
pub fn validate_request(
    catalog: Option<&FeatureCatalog>,
    action: Action,
    resource: &str,
    records: &[Value],
) -> Result<(), ValidationError> {
    match WriteKind::of(action, resource) {
        Some(WriteKind::Values) => validate_values(catalog, records),
        Some(WriteKind::ActiveProgram) => validate_programs(catalog, records),
        None => Ok(()),
    }
}

/// Validate `{uid, value}` records.
pub fn validate_values(
    catalog: Option<&FeatureCatalog>,
    records: &[Value],
) -> Result<(), ValidationError> {
    let catalog = catalog.ok_or(ValidationError::NoCatalog)?;

    for record in records {
        let raw_uid = record.get("uid").ok_or(ValidationError::MissingUid)?;
        let id = FeatureId::from_json_int(raw_uid).ok_or_else(|| ValidationError::UidNotInteger {
            uid: raw_uid.to_string(),
        })?;
        let value = record
            .get("value")
            .ok_or_else(|| ValidationError::MissingValue { uid: id.to_string() })?;

        let feature = catalog
            .get(id.as_str())
            .ok_or_else(|| ValidationError::UnknownFeature { uid: id.to_string() })?;

        tracing::debug!(
            feature = %feature.name,
            uid = %id,
            "Processing feature"
        );

        check_access(&id, feature)?;
        check_enumeration(&id, feature, value)?;
        check_range(&id, feature, value)?;
    }

    Ok(())
}

fn check_access(id: &FeatureId, feature: &FeatureDescriptor) -> Result<(), ValidationError> {
    let access = feature.access.as_ref().ok_or_else(|| ValidationError::NoAccess {
        uid: id.to_string(),
        name: feature.name.clone(),
    })?;

    if !access.is_writable() {
        return Err(ValidationError::NotWritable {
            uid: id.to_string(),
            name: feature.name.clone(),
            access: access.to_string(),
        });
    }
    Ok(())
}

fn check_enumeration(
    id: &FeatureId,
    feature: &FeatureDescriptor,
    value: &Value,
) -> Result<(), ValidationError> {
    let Some(allowed) = feature.values.as_ref() else {
        return Ok(());
    };

    // Enumeration keys are text but always hold integers
    let int = as_integer(value).ok_or_else(|| ValidationError::ValueNotInteger {
        uid: id.to_string(),
        value: value.to_string(),
    })?;

    if !allowed.contains_key(&int.to_string()) {
        return Err(ValidationError::ValueNotAllowed {
            uid: id.to_string(),
            value: value.to_string(),
            allowed: allowed
                .iter()
                .map(|(raw, label)| format!("{raw} ({label})"))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(())
}

fn check_range(
    id: &FeatureId,
    feature: &FeatureDescriptor,
    value: &Value,
) -> Result<(), ValidationError> {
    if !feature.has_range() {
        return Ok(());
    }

    let min = feature.min.map_or_else(|| "-inf".to_string(), |v| v.to_string());
    let max = feature.max.map_or_else(|| "inf".to_string(), |v| v.to_string());

    let int = as_integer(value).ok_or_else(|| ValidationError::ValueNotInteger {
        uid: id.to_string(),
        value: value.to_string(),
    })?;

    let below = feature.min.is_some_and(|lo| int < lo);
    let above = feature.max.is_some_and(|hi| int > hi);
    if below || above {
        return Err(ValidationError::OutOfRange {
            uid: id.to_string(),
            value: int,
            min,
            max,
        });
    }
    Ok(())
}

/// Integer-typed JSON value. Values above `i64::MAX` are out of every range
/// the catalogs declare and are saturated.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    value.as_u64().map(|_| i64::MAX)
}

/// Validate `{program, options?}` records.
pub fn validate_programs(
    catalog: Option<&FeatureCatalog>,
    records: &[Value],
) -> Result<(), ValidationError> {
    let catalog = catalog.ok_or(ValidationError::NoCatalog)?;

    for record in records {
        let raw = record.get("program").ok_or(ValidationError::MissingProgram)?;
        let id = FeatureId::from_json_int(raw).ok_or_else(|| ValidationError::ProgramNotInteger {
            uid: raw.to_string(),
        })?;

        let feature = catalog
            .get(id.as_str())
            .ok_or_else(|| ValidationError::UnknownProgram { uid: id.to_string() })?;

        if !feature.is_program() {
            return Err(ValidationError::NotAProgram {
                uid: id.to_string(),
                name: feature.name.clone(),
            });
        }

        if let Some(options) = record.get("options") {
            check_options(catalog, &id, options)?;
        }
    }

    Ok(())
}

fn check_options(
    catalog: &FeatureCatalog,
    program: &FeatureId,
    options: &Value,
) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidOptions {
        program: program.to_string(),
    };

    for option in options.as_array().ok_or_else(invalid)? {
        let uid = option.get("uid").ok_or_else(invalid)?;
        let id = FeatureId::from_json(uid);
        if !catalog.contains(id.as_str()) {
            return Err(ValidationError::UnknownOption { uid: id.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Access;
    use serde_json::json;

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new()
            .with_feature(
                539,
                FeatureDescriptor::new("BSH.Common.Setting.PowerState")
                    .with_access(Access::ReadWrite)
                    .with_value("1", "Off")
                    .with_value("2", "On"),
            )
            .with_feature(
                5,
                FeatureDescriptor::new("Cooking.Hood.Setting.Level")
                    .with_access(Access::WriteOnly)
                    .with_range(0, 100),
            )
            .with_feature(
                527,
                FeatureDescriptor::new("BSH.Common.Status.DoorState").with_access(Access::Read),
            )
            .with_feature(600, FeatureDescriptor::new("BSH.Common.Status.Unlisted"))
            .with_feature(
                8192,
                FeatureDescriptor::new("Dishcare.Dishwasher.Program.Eco50"),
            )
            .with_feature(
                558,
                FeatureDescriptor::new("BSH.Common.Option.StartInRelative"),
            )
    }

    #[test]
    fn test_accepts_valid_writes() {
        let catalog = catalog();
        validate_values(
            Some(&catalog),
            &[
                json!({"uid": 539, "value": 2}),
                json!({"uid": 5, "value": 0}),
                json!({"uid": 5, "value": 100}),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_rejects_structural_problems() {
        let catalog = catalog();
        let check = |record: Value| validate_values(Some(&catalog), &[record]).unwrap_err();

        assert_eq!(check(json!({"value": 1})), ValidationError::MissingUid);
        assert!(matches!(
            check(json!({"uid": "539", "value": 1})),
            ValidationError::UidNotInteger { .. }
        ));
        assert!(matches!(
            check(json!({"uid": 539})),
            ValidationError::MissingValue { .. }
        ));
        assert_eq!(
            check(json!({"uid": 1, "value": 1})),
            ValidationError::UnknownFeature {
                uid: "1".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_non_writable_access() {
        let catalog = catalog();
        let read_only = validate_values(Some(&catalog), &[json!({"uid": 527, "value": 1})]);
        assert!(matches!(read_only, Err(ValidationError::NotWritable { .. })));

        let no_access = validate_values(Some(&catalog), &[json!({"uid": 600, "value": 1})]);
        assert!(matches!(no_access, Err(ValidationError::NoAccess { .. })));
    }

    #[test]
    fn test_enumeration_requires_integer_key() {
        let catalog = catalog();
        let check = |value: Value| {
            validate_values(Some(&catalog), &[json!({"uid": 539, "value": value})])
        };

        assert!(matches!(
            check(json!("2")),
            Err(ValidationError::ValueNotInteger { .. })
        ));
        assert!(matches!(
            check(json!(3)),
            Err(ValidationError::ValueNotAllowed { .. })
        ));
        assert!(check(json!(1)).is_ok());
    }

    #[test]
    fn test_range_is_inclusive() {
        let catalog = catalog();
        let check = |value: Value| validate_values(Some(&catalog), &[json!({"uid": 5, "value": value})]);

        assert!(check(json!(0)).is_ok());
        assert!(check(json!(100)).is_ok());
        assert!(matches!(
            check(json!(150)),
            Err(ValidationError::OutOfRange { value: 150, .. })
        ));
        assert!(matches!(
            check(json!(-1)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            check(json!(50.5)),
            Err(ValidationError::ValueNotInteger { .. })
        ));
    }

    #[test]
    fn test_first_violation_wins() {
        let catalog = catalog();
        let err = validate_values(
            Some(&catalog),
            &[
                json!({"uid": 539, "value": 1}),
                json!({"uid": 527, "value": 1}),
                json!({"uid": 1, "value": 1}),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NotWritable { .. }));
    }

    #[test]
    fn test_program_activation() {
        let catalog = catalog();
        validate_programs(
            Some(&catalog),
            &[json!({"program": 8192, "options": [{"uid": 558, "value": 1800}]})],
        )
        .unwrap();

        assert_eq!(
            validate_programs(Some(&catalog), &[json!({"options": []})]).unwrap_err(),
            ValidationError::MissingProgram
        );
        assert!(matches!(
            validate_programs(Some(&catalog), &[json!({"program": "8192"})]),
            Err(ValidationError::ProgramNotInteger { .. })
        ));
        assert!(matches!(
            validate_programs(Some(&catalog), &[json!({"program": 9999})]),
            Err(ValidationError::UnknownProgram { .. })
        ));
        // known id, but not a program
        assert!(matches!(
            validate_programs(Some(&catalog), &[json!({"program": 539})]),
            Err(ValidationError::NotAProgram { .. })
        ));
        assert!(matches!(
            validate_programs(
                Some(&catalog),
                &[json!({"program": 8192, "options": [{"uid": 4242, "value": 1}]})]
            ),
            Err(ValidationError::UnknownOption { .. })
        ));
        assert!(matches!(
            validate_programs(Some(&catalog), &[json!({"program": 8192, "options": 3})]),
            Err(ValidationError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_only_mutating_posts_are_checked() {
        let catalog = catalog();
        let bad = [json!({"uid": 1, "value": 1})];

        assert!(validate_request(Some(&catalog), Action::Get, "/ro/values", &bad).is_ok());
        assert!(validate_request(Some(&catalog), Action::Post, "/ro/selectedProgram", &bad).is_ok());
        assert!(validate_request(Some(&catalog), Action::Post, "/ro/values", &bad).is_err());
        assert!(validate_request(None, Action::Post, "/ro/activeProgram", &bad).is_err());
    }
}
