use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Configuration for the write-access policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Role a caller must hold to upload documents.
    pub write_role: String,
    /// Identity attribute the role is read from.
    pub role_attribute: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            write_role: "admin".into(),
            role_attribute: "hf.Affiliation".into(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> GateResult<()> {
        if self.write_role.trim().is_empty() {
            return Err(GateError::Config("write_role must not be empty".into()));
        }
        if self.role_attribute.trim().is_empty() {
            return Err(GateError::Config("role_attribute must not be empty".into()));
        }
        Ok(())
    }
}
