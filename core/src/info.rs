use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Auxiliary key/value data associated with an active intercept.
pub type Metadata = BTreeMap<String, String>;

/// Answer to an interception query. Built fresh for every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterceptInfo {
    /// True when the queried request is currently intercepted.
    pub intercepted: bool,
    /// True when the answer comes from a sensor on the developer workstation,
    /// false when it comes from the agent running beside the workload.
    pub client_side: bool,
    /// Present only when the bound policy associates data with the intercept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl InterceptInfo {
    pub fn new(intercepted: bool, client_side: bool) -> Self {
        Self {
            intercepted,
            client_side,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether the process asking should handle the request itself.
    ///
    /// A client-side sensor consumes intercepted requests; a cluster-side
    /// agent consumes the ones that are not intercepted.
    pub fn consume_here(&self) -> bool {
        self.intercepted == self.client_side
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn consume_here_truth_table() {
        assert!(InterceptInfo::new(true, true).consume_here());
        assert!(!InterceptInfo::new(false, true).consume_here());
        assert!(!InterceptInfo::new(true, false).consume_here());
        assert!(InterceptInfo::new(false, false).consume_here());
    }

    #[test]
    fn serializes_with_camel_case_and_omits_absent_metadata() {
        let value = serde_json::to_value(InterceptInfo::new(true, false)).unwrap();
        assert_eq!(value, json!({"intercepted": true, "clientSide": false}));
    }

    #[test]
    fn serializes_metadata_when_present() {
        let info = InterceptInfo::new(true, false)
            .with_metadata(Metadata::from([("a".to_string(), "A".to_string())]));
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(
            value,
            json!({"intercepted": true, "clientSide": false, "metadata": {"a": "A"}})
        );
    }

    #[test]
    fn decodes_null_metadata_as_absent() {
        let info: InterceptInfo =
            serde_json::from_str(r#"{"intercepted":true,"clientSide":true,"metadata":null}"#)
                .unwrap();
        assert_eq!(info, InterceptInfo::new(true, true));
    }
}
