//! Inbound message routing.
//!
//! Each decoded frame is routed on its `(action, resource)` pair through a
//! table built once per [`Dispatcher`]. Frames carrying a device error `code`
//! skip the table entirely and come back as `{error, resource}`.
//!
//! | Action            | Resource                                   | Handling                    |
//! |-------------------|--------------------------------------------|-----------------------------|
//! | POST              | `/ei/initialValues`                        | establish session, reply    |
//! | RESPONSE / NOTIFY | `/ci/info`, `/iz/info`, `/ni/info`         | first record verbatim       |
//! | RESPONSE / NOTIFY | `/ro/values`, `/ro/allMandatoryValues`     | normalized values           |
//! | RESPONSE / NOTIFY | `/ci/services`                             | service versions            |
//! | RESPONSE / NOTIFY | `/ci/authentication`                       | capture token               |
//! | RESPONSE / NOTIFY | description changes, registered devices, `/ni/config`, `/ci/tzInfo` | ignored |
//!
//! Everything else is logged and ignored.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::message::{Action, Envelope, Identity};
use super::resource::Resource;
use super::session::Session;
use super::values::{normalize, Values};
use crate::catalog::FeatureCatalog;
use crate::error::{HcError, Result};

/// Route key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    /// Verb
    pub action: Action,
    /// Resource
    pub resource: Resource,
}

impl Route {
    /// Create a route key
    pub fn new(action: Action, resource: Resource) -> Self {
        Self { action, resource }
    }
}

/// What handling one frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatched {
    /// Values for the caller (empty when there is nothing to report)
    pub values: Values,
    /// Frame that must go back to the device in the same receive cycle
    pub reply: Option<Envelope>,
}

impl Dispatched {
    fn empty() -> Self {
        Self::default()
    }

    fn values(values: Values) -> Self {
        Self {
            values,
            reply: None,
        }
    }
}

/// State a handler may read or update
pub struct Inbound<'a> {
    /// Connection session
    pub session: &'a mut Session,
    /// Feature catalog, when one was supplied
    pub catalog: Option<&'a FeatureCatalog>,
    /// Identity for the initial-values reply
    pub identity: &'a Identity,
    /// Device label for logs
    pub label: &'a str,
}

type Handler = fn(&mut Inbound<'_>, &Envelope) -> Result<Dispatched>;

/// `(action, resource)` routing table
pub struct Dispatcher {
    routes: HashMap<Route, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Build the routing table
    pub fn new() -> Self {
        let mut dispatcher = Self {
            routes: HashMap::new(),
        };

        dispatcher.add(Action::Post, Resource::InitialValues, initial_values);

        for action in [Action::Response, Action::Notify] {
            dispatcher.add(action, Resource::CiInfo, first_record);
            dispatcher.add(action, Resource::IzInfo, first_record);
            dispatcher.add(action, Resource::NiInfo, first_record);

            dispatcher.add(action, Resource::Values, values);
            dispatcher.add(action, Resource::AllMandatoryValues, values);

            dispatcher.add(action, Resource::Services, services);
            dispatcher.add(action, Resource::Authentication, authentication);

            // Shapes are not consumable yet
            dispatcher.add(action, Resource::DescriptionChange, ignored);
            dispatcher.add(action, Resource::AllDescriptionChanges, ignored);
            dispatcher.add(action, Resource::RegisteredDevices, ignored);
            dispatcher.add(action, Resource::NiConfig, ignored);
            dispatcher.add(action, Resource::TzInfo, ignored);
        }

        dispatcher
    }

    fn add(&mut self, action: Action, resource: Resource, handler: Handler) {
        self.routes.insert(Route::new(action, resource), handler);
    }

    /// Whether a frame with this action and path has a handler
    pub fn handles(&self, action: Action, resource: &str) -> bool {
        self.lookup(action, resource).is_some()
    }

    /// Number of routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn lookup(&self, action: Action, resource: &str) -> Option<Handler> {
        let resource = Resource::from_path(resource)?;
        self.routes.get(&Route::new(action, resource)).copied()
    }

    /// Decode and handle raw frame bytes
    pub fn dispatch(&self, cx: &mut Inbound<'_>, bytes: &[u8]) -> Result<Dispatched> {
        let msg = Envelope::decode(bytes)?;
        tracing::debug!(device = cx.label, resource = %msg.resource, action = %msg.action, "RX");
        self.dispatch_envelope(cx, &msg)
    }

    /// Handle an already decoded frame
    pub fn dispatch_envelope(&self, cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
        if let Some(code) = &msg.code {
            let mut values = Values::new();
            values.insert("error".to_string(), code.clone());
            values.insert("resource".to_string(), Value::from(msg.resource.clone()));
            return Ok(Dispatched::values(values));
        }

        if let Some(handler) = self.lookup(msg.action, &msg.resource) {
            return handler(cx, msg);
        }

        match msg.action {
            Action::Post => {
                tracing::debug!(device = cx.label, resource = %msg.resource, "Unknown resource");
            },
            Action::Response | Action::Notify => {
                tracing::debug!(device = cx.label, message = ?msg, "Unknown response or notify");
            },
            Action::Get | Action::Unknown => {
                tracing::debug!(device = cx.label, message = ?msg, "Unknown message");
            },
        }
        Ok(Dispatched::empty())
    }
}

fn initial_values(cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
    let first_id = msg
        .first_record()
        .and_then(|r| r.get("edMsgID"))
        .and_then(Value::as_u64)
        .ok_or_else(|| HcError::Protocol("initialValues without edMsgID".to_string()))?;

    cx.session.establish(msg.session_id.clone(), first_id);
    tracing::info!(
        device = cx.label,
        session = ?msg.session_id,
        first_message_id = first_id,
        "Session established"
    );

    let identity = serde_json::to_value(cx.identity)?;
    Ok(Dispatched {
        values: Values::new(),
        reply: Some(Envelope::reply(msg, identity)),
    })
}

fn first_record(_cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
    match msg.first_record() {
        Some(Value::Object(record)) => Ok(Dispatched::values(record.clone())),
        _ => Ok(Dispatched::empty()),
    }
}

fn values(cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
    match &msg.data {
        Some(records) => Ok(Dispatched::values(normalize(cx.catalog, records)?)),
        None => {
            tracing::debug!(device = cx.label, message = ?msg, "Values message without data");
            Ok(Dispatched::empty())
        },
    }
}

#[derive(Deserialize)]
struct ServiceRecord {
    service: String,
    version: u32,
}

fn services(cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
    let records = msg.data.as_deref().unwrap_or_default();
    // Parse everything before touching the session
    let parsed = records
        .iter()
        .map(|r| {
            ServiceRecord::deserialize(r)
                .map(|s| (s.service, s.version))
                .map_err(|e| HcError::MalformedMessage(format!("service record {r}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(device = cx.label, services = ?parsed, "Services discovered");
    cx.session.record_services(parsed);
    Ok(Dispatched::empty())
}

fn authentication(cx: &mut Inbound<'_>, msg: &Envelope) -> Result<Dispatched> {
    if let Some(token) = msg
        .first_record()
        .and_then(|r| r.get("response"))
        .and_then(Value::as_str)
    {
        cx.session.set_auth_token(token.to_string());
    }
    Ok(Dispatched::empty())
}

fn ignored(_cx: &mut Inbound<'_>, _msg: &Envelope) -> Result<Dispatched> {
    Ok(Dispatched::empty())
}
