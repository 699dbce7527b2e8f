//! End-to-end catalog, validation and normalization tests.
//!
//! Catalogs are loaded from files the way a deployment would ship them.

use std::io::Write;

use hcdev::config::Config;
use hcdev::protocol::{normalize, validate_request, Action};
use hcdev::{Access, FeatureCatalog, HcDevice, HcError, MemoryTransport, ValidationError};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

const DISHWASHER: &str = r#"{
    "539": {"name": "BSH.Common.Setting.PowerState", "access": "ReadWrite",
            "values": {"0": "Off", "1": "On", "2": "Standby"}},
    "527": {"name": "BSH.Common.Status.DoorState", "access": "read",
            "values": {"0": "Open", "1": "Closed"}},
    "5":   {"name": "BSH.Common.Setting.Brightness", "access": "writeOnly",
            "min": "0", "max": "100"},
    "551": {"name": "BSH.Common.Option.StartInRelative", "access": "readWrite",
            "min": 0, "max": 86340},
    "8192": {"name": "Dishcare.Dishwasher.Program.Eco50", "access": "readWrite"},
    "8196": {"name": "Dishcare.Dishwasher.Program.Auto2", "access": "readWrite"},
    "10":  {"name": "BSH.Common.Root.ActiveProgram", "access": "readWrite"}
}"#;

fn catalog_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DISHWASHER.as_bytes()).unwrap();
    file
}

fn connected(catalog: FeatureCatalog) -> HcDevice<MemoryTransport> {
    let mut transport = MemoryTransport::new();
    transport.push_json(&json!({
        "sID": 12, "msgID": 1, "resource": "/ei/initialValues",
        "version": 2, "action": "POST", "data": [{"edMsgID": 30}]
    }));
    transport.push_json(&json!({
        "sID": 12, "msgID": 2, "resource": "/ci/services",
        "version": 1, "action": "RESPONSE", "data": [{"service": "ro", "version": 1}]
    }));
    let mut device = HcDevice::new("dishwasher", transport, Some(catalog));
    device.connect().unwrap();
    device.transport_mut().clear_sent();
    device
}

/// Test loading a catalog from disk
#[test]
fn test_load_catalog_file() {
    let file = catalog_file();
    let catalog = FeatureCatalog::load(file.path()).unwrap();

    assert_eq!(catalog.len(), 7);
    let power = catalog.get("539").unwrap();
    assert_eq!(power.access, Some(Access::ReadWrite));
    assert_eq!(power.label("1"), Some("On"));

    let brightness = catalog.get("5").unwrap();
    assert_eq!((brightness.min, brightness.max), (Some(0), Some(100)));
}

/// Test that a missing catalog file is a config error
#[test]
fn test_missing_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FeatureCatalog::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, HcError::Config(_)));
}

/// Test catalog path resolution through a config file
#[test]
fn test_catalog_path_from_config() {
    let catalog = catalog_file();
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        "[client]\ndevice_name = \"bridge\"\n\n[catalog]\npath = {:?}",
        catalog.path().display().to_string()
    )
    .unwrap();

    let config = Config::from_file(config_file.path()).unwrap();
    assert_eq!(config.client.device_name, "bridge");
    assert_eq!(config.client.device_id, "0badcafe");

    let path = config.catalog.path.unwrap();
    assert_eq!(FeatureCatalog::load(path).unwrap().len(), 7);
}

/// Test the out-of-range write from a loaded catalog
#[test]
fn test_out_of_range_is_rejected_before_sending() {
    let catalog = FeatureCatalog::load(catalog_file().path()).unwrap();
    let mut device = connected(catalog);
    let next = device.session().next_message_id();

    let err = device
        .set_values(json!({"uid": 5, "value": 150}))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        HcError::Validation(ValidationError::OutOfRange {
            uid: "5".to_string(),
            value: 150,
            min: "0".to_string(),
            max: "100".to_string(),
        })
        .to_string()
    );
    assert!(device.transport().sent().is_empty());
    assert_eq!(device.session().next_message_id(), next);

    // bounds are inclusive
    device.set_values(json!({"uid": 5, "value": 100})).unwrap();
    device.set_values(json!({"uid": 5, "value": 0})).unwrap();
    assert_eq!(device.transport().sent().len(), 2);
}

/// Test that one bad record rejects the whole batch
#[test]
fn test_batch_is_all_or_nothing() {
    let catalog = FeatureCatalog::from_json(DISHWASHER).unwrap();
    let mut device = connected(catalog);

    let err = device
        .set_values(json!([
            {"uid": 539, "value": 1},
            {"uid": 527, "value": 1}
        ]))
        .unwrap_err();

    assert!(matches!(
        err,
        HcError::Validation(ValidationError::NotWritable { .. })
    ));
    assert!(device.transport().sent().is_empty());
}

/// Test enumeration checks on the write path
#[test]
fn test_enumeration_writes() {
    let catalog = FeatureCatalog::from_json(DISHWASHER).unwrap();
    let records = |value: Value| vec![json!({"uid": 539, "value": value})];

    assert!(validate_request(Some(&catalog), Action::Post, "/ro/values", &records(json!(2))).is_ok());
    assert!(matches!(
        validate_request(Some(&catalog), Action::Post, "/ro/values", &records(json!(7))),
        Err(ValidationError::ValueNotAllowed { .. })
    ));
    assert!(matches!(
        validate_request(Some(&catalog), Action::Post, "/ro/values", &records(json!("On"))),
        Err(ValidationError::ValueNotInteger { .. })
    ));
    // reads are never validated
    assert!(validate_request(Some(&catalog), Action::Get, "/ro/values", &records(json!(7))).is_ok());
}

/// Test program activation against the program marker
#[test]
fn test_program_activation() {
    let catalog = FeatureCatalog::from_json(DISHWASHER).unwrap();
    let mut device = connected(catalog);

    device
        .start_program(json!({"program": 8192, "options": [{"uid": 551, "value": 3600}]}))
        .unwrap();

    let err = device.start_program(json!({"program": 10})).unwrap_err();
    assert!(matches!(
        err,
        HcError::Validation(ValidationError::NotAProgram { ref name, .. })
            if name == "BSH.Common.Root.ActiveProgram"
    ));

    let err = device
        .start_program(json!({"program": 8196, "options": [{"uid": 999}]}))
        .unwrap_err();
    assert!(matches!(
        err,
        HcError::Validation(ValidationError::UnknownOption { .. })
    ));

    let sent = device.transport().sent_envelopes();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].resource, "/ro/activeProgram");
    assert_eq!(sent[0].action, Action::Post);
}

/// Test enumerated values are reported by label
#[test]
fn test_normalize_with_loaded_catalog() {
    let catalog = FeatureCatalog::load(catalog_file().path()).unwrap();
    let values = normalize(
        Some(&catalog),
        &[
            json!({"uid": 539, "value": 1}),
            json!({"uid": 527, "value": 0}),
            json!({"uid": 5, "value": 64}),
            json!({"uid": 4242, "value": true}),
        ],
    )
    .unwrap();

    assert_eq!(
        Value::Object(values),
        json!({"PowerState": "On", "DoorState": "Open", "Brightness": 64, "4242": true})
    );
}

/// Test that writes without a catalog are refused
#[test]
fn test_writes_need_a_catalog() {
    let mut transport = MemoryTransport::new();
    transport.push_json(&json!({
        "sID": 1, "msgID": 1, "resource": "/ei/initialValues",
        "version": 2, "action": "POST", "data": [{"edMsgID": 1}]
    }));
    transport.push_json(&json!({
        "sID": 1, "msgID": 2, "resource": "/ci/services",
        "version": 1, "action": "RESPONSE", "data": []
    }));
    let mut device = HcDevice::new("bare", transport, None);
    device.connect().unwrap();

    assert!(matches!(
        device.set_values(json!({"uid": 539, "value": 1})),
        Err(HcError::Validation(ValidationError::NoCatalog))
    ));
    // plain reads still work
    device.get("/ro/allMandatoryValues").unwrap();
}
