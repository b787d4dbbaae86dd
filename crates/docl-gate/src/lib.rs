//! Identity gate for DocLedger.
//!
//! Every call carries an opaque identity context supplied by the host. The
//! gate converts it once, at the boundary, into a typed [`Identity`] and
//! decides whether the caller may perform an [`Action`].
//!
//! # Quick Start
//!
//! ```rust
//! use docl_gate::{AccessGate, Action, GateConfig, StaticIdentity};
//!
//! let gate = AccessGate::new(GateConfig::default());
//! let ctx = StaticIdentity::new("OrgMSP", "admin-id").with_attribute("hf.Affiliation", "admin");
//! let principal = gate.authorize_context(&ctx, Action::Upload).unwrap();
//! assert_eq!(principal.org_id, "OrgMSP");
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{AccessGate, Action, Principal};
pub use identity::{Identity, IdentityContext, StaticIdentity};
