use std::collections::BTreeMap;

/// Per-call identity context supplied by the host runtime.
pub trait IdentityContext: Send + Sync {
    /// Membership service provider (organization) id.
    fn msp_id(&self) -> &str;
    /// Caller id, e.g. an X.509 subject.
    fn id(&self) -> &str;
    /// Value of a certificate attribute, if present.
    fn attribute_value(&self, name: &str) -> Option<String>;
}

/// Typed caller identity, built once at the boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub org_id: String,
    pub caller_id: String,
    pub role: Option<String>,
}

impl Identity {
    pub fn new(org_id: impl Into<String>, caller_id: impl Into<String>, role: Option<String>) -> Self {
        Self {
            org_id: org_id.into(),
            caller_id: caller_id.into(),
            role,
        }
    }

    /// Extract an identity from a host context, reading the role from
    /// `role_attribute`.
    pub fn from_context(ctx: &(impl IdentityContext + ?Sized), role_attribute: &str) -> Self {
        Self {
            org_id: ctx.msp_id().to_string(),
            caller_id: ctx.id().to_string(),
            role: ctx.attribute_value(role_attribute),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

/// Fixed identity context, for CLIs, tests, and embedding.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity {
    msp_id: String,
    id: String,
    attributes: BTreeMap<String, String>,
}

impl StaticIdentity {
    pub fn new(msp_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl IdentityContext for StaticIdentity {
    fn msp_id(&self) -> &str {
        &self.msp_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}
