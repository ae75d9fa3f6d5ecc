// input module event payloads

use crate::protocol::value::{Handle, SharedId, SharedReference, Value};
use serde::{Deserialize, Serialize};

/// Element the dialog was opened for, as a node reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementReference {
    pub shared_id: SharedId,
    #[serde(default)]
    pub handle: Option<Handle>,
}

impl ElementReference {
    /// Converts into an argument value for a follow-up script call.
    pub fn to_value(&self) -> Value {
        Value::SharedReference(SharedReference {
            shared_id: self.shared_id.clone(),
            handle: self.handle.clone(),
        })
    }
}

/// `input.fileDialogOpened`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDialogInfo {
    pub context: String,
    #[serde(default)]
    pub element: Option<ElementReference>,
    pub multiple: bool,
}
