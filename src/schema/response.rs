use serde::Deserialize;

/// A single-decision verdict. An absent `result` means the policy did not
/// produce a value, which callers must treat as a denial. Unknown fields
/// in the response body are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpaQueryResult {
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(default)]
    pub result: Option<bool>,
}

/// A batch filtering verdict: the indexes of the authorized entries in
/// the submitted `filterResources` list. An absent `result` means nothing
/// was authorized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpaBatchQueryResult {
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<usize>>,
}
