//! Outbound request description.

use serde_json::Value;

use super::message::Action;

/// A request the caller wants sent to the device.
///
/// Session id, message id and (unless overridden) version are filled in by
/// the device handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Resource path
    pub resource: String,
    /// Explicit version, bypassing service negotiation
    pub version: Option<u32>,
    /// Verb (GET unless changed)
    pub action: Action,
    /// Records to send
    pub data: Option<Vec<Value>>,
}

impl Request {
    /// GET a resource
    pub fn get(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            version: None,
            action: Action::Get,
            data: None,
        }
    }

    /// POST records to a resource
    pub fn post(resource: &str, data: Value) -> Self {
        Self::get(resource).with_action(Action::Post).with_data(data)
    }

    /// Override the version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Change the verb
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Attach data; a single record is wrapped into a one-element list
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(match data {
            Value::Array(records) => records,
            record => vec![record],
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_record_is_wrapped() {
        let req = Request::post("/ro/values", json!({"uid": 539, "value": 2}));
        assert_eq!(req.action, Action::Post);
        assert_eq!(req.data, Some(vec![json!({"uid": 539, "value": 2})]));
    }

    #[test]
    fn test_list_is_kept() {
        let req = Request::get("/ro/values").with_data(json!([{"uid": 1}, {"uid": 2}]));
        assert_eq!(req.data.map(|d| d.len()), Some(2));
        assert_eq!(req.version, None);
    }
}
