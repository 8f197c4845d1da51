//! The per-test result record and its JSON encoding.
//!
//! Approval is a native `bool` in memory. On the wire it is the string
//! `"True"` or `"False"`, which existing consumers expect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lcgwalk_core::{Error, Result};

/// Outcome of one hypothesis test. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    /// Human-readable explanation of the accept/reject decision.
    pub decision: String,
    #[serde(
        default,
        alias = "isApproved",
        serialize_with = "approval::serialize",
        deserialize_with = "approval::deserialize"
    )]
    pub is_approved: bool,
    /// Named numeric fields needed to audit the decision.
    #[serde(default)]
    pub statistics: BTreeMap<String, f64>,
}

impl TestResult {
    pub(crate) fn new(
        test_name: &str,
        is_approved: bool,
        decision: String,
        statistics: &[(&str, f64)],
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            decision,
            is_approved,
            statistics: statistics
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        }
    }

    /// Look up a named statistic.
    pub fn statistic(&self, name: &str) -> Option<f64> {
        self.statistics.get(name).copied()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::MalformedResult(e.to_string()))
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| Error::MalformedResult(e.to_string()))
    }

    /// Parse a serialized result.
    ///
    /// A missing or unrecognised approval value reads as not approved. A
    /// record carrying both `is_approved` and `isApproved` is ambiguous and
    /// fails with [`Error::MalformedResult`].
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::MalformedResult(e.to_string()))
    }
}

mod approval {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(approved: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *approved { "True" } else { "False" })
    }

    // Fail closed: anything other than a clear "true" is not approved.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match serde_json::Value::deserialize(d)? {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}
