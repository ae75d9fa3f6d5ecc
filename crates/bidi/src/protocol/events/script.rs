// script module event payloads
//
// See: https://w3c.github.io/webdriver-bidi/#module-script-events

use crate::protocol::value::Value;
use serde::{Deserialize, Serialize};

/// `script.Source`: the realm (and browsing context, if any) a value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub realm: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// `script.message`
///
/// `data` is whatever the page passed to the channel, so it is a [`Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub channel: String,
    pub data: Value,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmType {
    Window,
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
    Worker,
    PaintWorklet,
    AudioWorklet,
    Worklet,
    #[serde(other)]
    Other,
}

/// `script.RealmInfo`, carried by `realmCreated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmInfo {
    pub realm: String,
    pub origin: String,
    #[serde(rename = "type")]
    pub realm_type: RealmType,
    /// Set for window realms
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub sandbox: Option<String>,
    /// Owning realms of a worker
    #[serde(default)]
    pub owners: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmDestroyed {
    pub realm: String,
}
