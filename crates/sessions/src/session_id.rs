use std::fmt;

use serde::Serialize;

/// Opaque identity of one live connection.
///
/// Always minted from a random UUID v4, never derived from addresses or
/// client-supplied data, so two open connections cannot share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a new unique session id.
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_ids_are_unique() {
        let ids: HashSet<SessionId> = (0..1_000).map(|_| SessionId::mint()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn displays_as_uuid() {
        let id = SessionId::mint();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_eq!(id.to_string(), id.as_str());
    }
}
