// browsingContext module event payloads
//
// See: https://w3c.github.io/webdriver-bidi/#module-browsingContext-events

use serde::{Deserialize, Serialize};

/// `browsingContext.Info`, carried by `contextCreated` / `contextDestroyed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub context: String,
    pub url: String,
    #[serde(default)]
    pub children: Option<Vec<Info>>,
    /// Parent browsing context; absent or null for top-level contexts
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub user_context: Option<String>,
    #[serde(default)]
    pub original_opener: Option<String>,
    #[serde(default)]
    pub client_window: Option<String>,
}

impl Info {
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// `browsingContext.NavigationInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInfo {
    pub context: String,
    /// Navigation id; null for navigations the runtime does not track
    #[serde(default)]
    pub navigation: Option<String>,
    pub timestamp: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadWillBegin {
    #[serde(flatten)]
    pub navigation: NavigationInfo,
    pub suggested_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryUpdated {
    pub context: String,
    pub url: String,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPromptType {
    Alert,
    Beforeunload,
    Confirm,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPromptHandlerType {
    Accept,
    Dismiss,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptOpened {
    pub context: String,
    pub handler: UserPromptHandlerType,
    pub message: String,
    #[serde(rename = "type")]
    pub prompt_type: UserPromptType,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptClosed {
    pub context: String,
    pub accepted: bool,
    #[serde(rename = "type")]
    pub prompt_type: UserPromptType,
    #[serde(default)]
    pub user_text: Option<String>,
}
