// log module event payloads
//
// See: https://w3c.github.io/webdriver-bidi/#module-log

use crate::protocol::events::script::Source;
use crate::protocol::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub column_number: u64,
    pub function_name: String,
    pub line_number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    pub call_frames: Vec<StackFrame>,
}

/// `log.Entry`
///
/// `entry_type` is `console` for console API calls (which also carry `method`
/// and `args`) and `javascript` for uncaught errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub level: Level,
    pub source: Source,
    #[serde(default)]
    pub text: Option<String>,
    pub timestamp: u64,
    #[serde(default)]
    pub stack_trace: Option<StackTrace>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<Value>>,
}
