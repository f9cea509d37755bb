//! References to entries inside a single host-side asset.
//!
//! Three addressing styles, all passed through to the host untouched:
//! - keyed entries by name (`KeyName`)
//! - ordered entries by zero-based position (`GeneratorIndex`, `TestIndex`)
//! - graph nodes by opaque handle (`NodeId`)
//!
//! Nothing here caches or validates a reference. Positions are only as good as
//! the host's ordering at the time of the call: removing an earlier sibling
//! shifts every later index, so re-read the asset structure rather than
//! holding indices across edits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based position of a generator on a query asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorIndex(u32);

impl GeneratorIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GeneratorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generator#{}", self.0)
    }
}

impl From<u32> for GeneratorIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Zero-based position of a test under one generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestIndex(u32);

impl TestIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TestIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test#{}", self.0)
    }
}

impl From<u32> for TestIndex {
    fn from(index: u32) -> Self {
        Self(index)
    }
}

/// Opaque handle the host hands back when it creates a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Name of a keyed entry. Duplicates are the host's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyName(String);

impl KeyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for KeyName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indices_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_value(GeneratorIndex::new(1)).unwrap(), json!(1));
        assert_eq!(serde_json::to_value(TestIndex::new(0)).unwrap(), json!(0));
    }

    #[test]
    fn node_id_is_opaque_string() {
        let id: NodeId = serde_json::from_value(json!("K2Node_Event_0")).unwrap();
        assert_eq!(id.as_str(), "K2Node_Event_0");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("K2Node_Event_0"));
    }

    #[test]
    fn negative_index_is_rejected() {
        assert!(serde_json::from_value::<GeneratorIndex>(json!(-1)).is_err());
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(GeneratorIndex::new(2).to_string(), "generator#2");
        assert_eq!(TestIndex::new(3).to_string(), "test#3");
    }
}
