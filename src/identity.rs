use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Stable user identifier: the connected wallet's public address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Accept a Solana-shaped address. Only the encoding is checked, the
    /// key itself is never verified.
    pub fn parse(address: &str) -> Result<Self, IdentityError> {
        let address = address.trim();
        let len = address.chars().count();
        if !(32..=44).contains(&len) {
            return Err(IdentityError::Length(len));
        }
        if let Some(c) = address.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
            return Err(IdentityError::InvalidCharacter(c));
        }
        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `7xKX...gAsU` style rendering for headers
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the current user, owned by the surrounding application
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity fixed at construction; models a wallet connected from the
/// command line or config file.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserId>,
}

impl StaticIdentity {
    pub fn new(user: Option<UserId>) -> Self {
        Self { user }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn connect(&mut self, user: UserId) {
        self.user = Some(user);
    }

    pub fn disconnect(&mut self) {
        self.user = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn current_user(&self) -> Option<UserId> {
        (**self).current_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn test_parse_valid_address() {
        let id = UserId::parse(WALLET).unwrap();
        assert_eq!(id.as_str(), WALLET);
        assert_eq!(id.short(), "7xKX...gAsU");
    }

    #[test]
    fn test_parse_rejects_short_address() {
        assert_eq!(UserId::parse("abc"), Err(IdentityError::Length(3)));
    }

    #[test]
    fn test_parse_rejects_non_base58() {
        let bad = "0xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
        assert_eq!(
            UserId::parse(bad),
            Err(IdentityError::InvalidCharacter('0'))
        );
    }

    #[test]
    fn test_static_identity_connect_disconnect() {
        let mut identity = StaticIdentity::anonymous();
        assert!(identity.current_user().is_none());
        identity.connect(UserId::parse(WALLET).unwrap());
        assert!(identity.current_user().is_some());
        identity.disconnect();
        assert!(identity.current_user().is_none());
    }
}
