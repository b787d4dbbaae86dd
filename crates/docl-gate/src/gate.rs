use std::fmt;

use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::identity::{Identity, IdentityContext};

/// Operations the gate decides on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Upload,
    View,
    History,
    Verify,
}

impl Action {
    /// Whether the action writes to the ledger or blob store.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Upload)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::View => "view",
            Self::History => "history",
            Self::Verify => "verify",
        })
    }
}

/// The authorized caller, as recorded in document metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub org_id: String,
    pub caller_id: String,
}

/// Write-access policy.
///
/// Writes require the caller's role to equal the configured write role;
/// reads are not role-gated. Decisions have no side effects beyond logging.
#[derive(Clone, Debug, Default)]
pub struct AccessGate {
    config: GateConfig,
}

impl AccessGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Convert a host context into a typed identity.
    pub fn identify(&self, ctx: &(impl IdentityContext + ?Sized)) -> Identity {
        Identity::from_context(ctx, &self.config.role_attribute)
    }

    pub fn authorize(&self, identity: &Identity, action: Action) -> GateResult<Principal> {
        if action.is_write() && !identity.has_role(&self.config.write_role) {
            warn!(
                caller = %identity.caller_id,
                org = %identity.org_id,
                role = identity.role.as_deref().unwrap_or("<none>"),
                %action,
                "write denied"
            );
            return Err(GateError::PermissionDenied {
                caller_id: identity.caller_id.clone(),
                action,
            });
        }

        debug!(caller = %identity.caller_id, org = %identity.org_id, %action, "access granted");
        Ok(Principal {
            org_id: identity.org_id.clone(),
            caller_id: identity.caller_id.clone(),
        })
    }

    /// [`Self::identify`] followed by [`Self::authorize`].
    pub fn authorize_context(
        &self,
        ctx: &(impl IdentityContext + ?Sized),
        action: Action,
    ) -> GateResult<Principal> {
        self.authorize(&self.identify(ctx), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;

    fn ctx(role: Option<&str>) -> StaticIdentity {
        let ctx = StaticIdentity::new("OrgMSP", "caller-1");
        match role {
            Some(role) => ctx.with_attribute("hf.Affiliation", role),
            None => ctx,
        }
    }

    #[test]
    fn admin_may_upload() {
        let gate = AccessGate::default();
        let principal = gate.authorize_context(&ctx(Some("admin")), Action::Upload).unwrap();
        assert_eq!(
            principal,
            Principal {
                org_id: "OrgMSP".into(),
                caller_id: "caller-1".into()
            }
        );
    }

    #[test]
    fn member_upload_denied() {
        let gate = AccessGate::default();
        let err = gate.authorize_context(&ctx(Some("member")), Action::Upload).unwrap_err();
        assert_eq!(
            err,
            GateError::PermissionDenied {
                caller_id: "caller-1".into(),
                action: Action::Upload
            }
        );
    }

    #[test]
    fn missing_role_upload_denied() {
        let gate = AccessGate::default();
        assert!(gate.authorize_context(&ctx(None), Action::Upload).is_err());
    }

    #[test]
    fn role_match_is_exact() {
        let gate = AccessGate::default();
        assert!(gate.authorize_context(&ctx(Some("Admin")), Action::Upload).is_err());
        assert!(gate.authorize_context(&ctx(Some("admin ")), Action::Upload).is_err());
    }

    #[test]
    fn reads_are_not_role_gated() {
        let gate = AccessGate::default();
        for action in [Action::View, Action::History, Action::Verify] {
            assert!(gate.authorize_context(&ctx(None), action).is_ok());
            assert!(gate.authorize_context(&ctx(Some("member")), action).is_ok());
        }
    }

    #[test]
    fn custom_role_attribute() {
        let gate = AccessGate::new(GateConfig {
            write_role: "writer".into(),
            role_attribute: "docl.role".into(),
        });
        let ok = StaticIdentity::new("OrgMSP", "w").with_attribute("docl.role", "writer");
        let wrong_attr = StaticIdentity::new("OrgMSP", "w").with_attribute("hf.Affiliation", "writer");
        assert!(gate.authorize_context(&ok, Action::Upload).is_ok());
        assert!(gate.authorize_context(&wrong_attr, Action::Upload).is_err());
    }

    #[test]
    fn denial_message_names_caller() {
        let gate = AccessGate::default();
        let err = gate.authorize_context(&ctx(None), Action::Upload).unwrap_err();
        assert!(err.to_string().contains("caller-1"));
        assert!(err.to_string().contains("upload"));
    }
}
