use crate::{Result, constants::IDLE_IDENTITY, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an enrolled fingerprint template.
///
/// `0` is reserved for "no active match"; `1..=255` name sensor template
/// slots assigned sequentially as enrollment succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Identity(u8);

impl Identity {
    /// The idle identity (no finger matched).
    pub const IDLE: Identity = Identity(IDLE_IDENTITY);

    /// Wrap a raw identity value. Every `u8` is a valid identity.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Identity(id)
    }

    /// Create a matched (non-idle) identity.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if `id` is 0.
    pub fn matched(id: u8) -> Result<Self> {
        if id == IDLE_IDENTITY {
            return Err(Error::InvalidIdentity(
                "Identity 0 is reserved for idle".to_string(),
            ));
        }
        Ok(Identity(id))
    }

    /// Get the raw identity as u8.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Index of this identity in the color assignment table.
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.0 == IDLE_IDENTITY
    }

    /// The identity following this one, or `None` when the table is full.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Identity)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_idle() {
            write!(f, "idle")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl From<u8> for Identity {
    fn from(id: u8) -> Self {
        Identity(id)
    }
}

impl TryFrom<u16> for Identity {
    type Error = Error;

    /// Sensor template pages are 16-bit; only the first 256 map to identities.
    fn try_from(page: u16) -> Result<Self> {
        u8::try_from(page)
            .map(Identity)
            .map_err(|_| Error::InvalidIdentity(format!("Template page {page} exceeds 255")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_identity_idle() {
        assert!(Identity::IDLE.is_idle());
        assert_eq!(Identity::default(), Identity::IDLE);
        assert_eq!(Identity::IDLE.to_string(), "idle");
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(255)]
    fn test_identity_matched_valid(#[case] raw: u8) {
        let id = Identity::matched(raw).unwrap();
        assert_eq!(id.as_u8(), raw);
        assert_eq!(id.as_index(), raw as usize);
        assert!(!id.is_idle());
    }

    #[test]
    fn test_identity_matched_rejects_zero() {
        assert!(Identity::matched(0).is_err());
    }

    #[rstest]
    #[case(0, Some(0))]
    #[case(42, Some(42))]
    #[case(255, Some(255))]
    #[case(256, None)]
    #[case(999, None)]
    fn test_identity_from_template_page(#[case] page: u16, #[case] expected: Option<u8>) {
        let id = Identity::try_from(page).ok().map(|id| id.as_u8());
        assert_eq!(id, expected);
    }

    #[test]
    fn test_identity_next() {
        assert_eq!(Identity::new(4).next(), Some(Identity::new(5)));
        assert_eq!(Identity::new(255).next(), None);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(Identity::new(7).to_string(), "#7");
    }
}
