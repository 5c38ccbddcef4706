//! Reward recipients, identified by IP.

use serde::{Deserialize, Serialize};
use validator::validate_ip_v4;

use crate::contact::ContactInfo;

/// Identity-verification state of a recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

impl Default for VerificationStatus {
    fn default() -> Self {
        VerificationStatus::Pending
    }
}

/// Who gets paid: an IP identity plus payable contact channels.
///
/// The program keys participation on IPv4 addresses rather than accounts,
/// so the IP doubles as the quota key for daily limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub ip: String,
    pub contact: ContactInfo,
    pub verification: VerificationStatus,
}

impl Recipient {
    pub fn new(ip: impl Into<String>, contact: ContactInfo) -> Self {
        Self {
            ip: ip.into(),
            contact,
            verification: VerificationStatus::default(),
        }
    }

    /// Strict dotted-quad check. Hostnames and IPv6 are not recipients.
    pub fn has_valid_ip(&self) -> bool {
        validate_ip_v4(&self.ip)
    }

    pub fn is_valid(&self) -> bool {
        self.has_valid_ip() && self.contact.is_valid()
    }
}
