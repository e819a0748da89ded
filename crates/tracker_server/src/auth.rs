//! Identity resolution and the per-connection session gate.
//!
//! The gate runs exactly once per connection attempt, before the connection
//! is admitted into any room or permitted to emit events. A credential is
//! presented as an opaque `token` query parameter on the WebSocket upgrade
//! request; the gate resolves it against the store and either attaches the
//! resulting [`Identity`] to the session or terminates the attempt.
//!
//! Callers cannot distinguish "store unreachable" from "no such user": both
//! reject with [`GateError::Unauthorized`].

use crate::store::{FleetStore, UserRecord};
use tracing::debug;

/// Role of an authenticated session, fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Supervising role; receives broadcasts, issues no commands
    Observer,
    /// Field operative role; reports location and owns packages
    Agent,
    /// Any stored role id that maps to neither - admitted but inert
    Unassigned(i16),
}

impl Role {
    /// Maps a stored role id to a role. `1` is observer, `2` is agent,
    /// anything else stays unassigned.
    pub fn from_id(role_id: i16) -> Self {
        match role_id {
            1 => Role::Observer,
            2 => Role::Agent,
            other => Role::Unassigned(other),
        }
    }

    /// Whether this role is permitted to report location and own packages.
    pub fn is_agent(&self) -> bool {
        matches!(self, Role::Agent)
    }
}

/// The resolved identity of an authenticated session.
///
/// Resolved once at gate time and immutable for the connection's lifetime;
/// there is no re-authentication mid-session.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Stable user id, also used as the agent id in ownership checks
    pub id: i64,
    /// Human-readable name included in location broadcasts
    pub display_name: String,
    /// Role assigned at admission time
    pub role: Role,
}

impl Identity {
    fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name,
            role: Role::from_id(record.role_id),
        }
    }
}

/// Reasons the session gate rejects a connection attempt.
///
/// The `Display` text of each variant is exactly what the client sees
/// before the connection is closed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    /// No credential was presented at connect time
    #[error("authentication required")]
    MissingCredential,

    /// The credential resolved to no identity, or the resolver errored
    #[error("not authorized")]
    Unauthorized,
}

/// Runs the session gate for one connection attempt.
///
/// Absence of a credential is itself a rejection - no anonymous
/// connections. Otherwise the credential is resolved through
/// [`resolve_identity`].
pub async fn authenticate(
    store: &dyn FleetStore,
    token: Option<&str>,
) -> Result<Identity, GateError> {
    let token = token.ok_or(GateError::MissingCredential)?;
    resolve_identity(store, token).await
}

/// Resolves an opaque credential to an [`Identity`].
///
/// Read-only lookup against the store. Lookup errors and empty results are
/// treated identically at the protocol level.
pub async fn resolve_identity(
    store: &dyn FleetStore,
    token: &str,
) -> Result<Identity, GateError> {
    match store.find_user_by_token(token).await {
        Ok(Some(record)) => Ok(Identity::from_record(record)),
        Ok(None) => Err(GateError::Unauthorized),
        Err(e) => {
            debug!("identity lookup failed: {e}");
            Err(GateError::Unauthorized)
        }
    }
}

/// Extracts the `token` parameter from a raw query string.
pub fn token_from_query(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_mapping() {
        assert_eq!(Role::from_id(1), Role::Observer);
        assert_eq!(Role::from_id(2), Role::Agent);
        assert_eq!(Role::from_id(7), Role::Unassigned(7));
        assert!(Role::from_id(2).is_agent());
        assert!(!Role::from_id(1).is_agent());
    }

    #[test]
    fn token_extraction() {
        assert_eq!(
            token_from_query(Some("token=abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            token_from_query(Some("foo=bar&token=abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(token_from_query(Some("foo=bar")), None);
        assert_eq!(token_from_query(None), None);
    }
}
