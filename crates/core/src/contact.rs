//! Recipient contact channels and their format rules.
//!
//! Payouts in this program settle over Chinese rails first (WeChat Pay,
//! Alipay), so those handles outrank email and phone when picking a
//! primary contact.

use serde::{Deserialize, Serialize};
use validator::validate_email;

// Handle length bounds imposed by the respective platforms.
const WECHAT_MIN_LEN: usize = 6;
const WECHAT_MAX_LEN: usize = 20;
const ALIPAY_MIN_LEN: usize = 6;
const ALIPAY_MAX_LEN: usize = 50;

/// How a recipient can be reached and paid. All channels are optional,
/// but the info is only usable when at least one is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub email: Option<String>,
    /// Mainland mobile number, 11 digits.
    pub phone: Option<String>,
    /// WeChat ID.
    pub wechat: Option<String>,
    /// Alipay account handle.
    pub alipay: Option<String>,
}

impl ContactInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_wechat(mut self, wechat: impl Into<String>) -> Self {
        self.wechat = Some(wechat.into());
        self
    }

    pub fn with_alipay(mut self, alipay: impl Into<String>) -> Self {
        self.alipay = Some(alipay.into());
        self
    }

    /// At least one channel is filled in.
    pub fn has_any_channel(&self) -> bool {
        self.email.is_some()
            || self.phone.is_some()
            || self.wechat.is_some()
            || self.alipay.is_some()
    }

    /// Valid means: at least one channel present, and every present channel
    /// passes its format rule. An absent channel never fails validation.
    pub fn is_valid(&self) -> bool {
        if !self.has_any_channel() {
            return false;
        }
        if let Some(email) = &self.email {
            if !validate_email(email) {
                return false;
            }
        }
        if let Some(phone) = &self.phone {
            if !is_valid_cn_mobile(phone) {
                return false;
            }
        }
        if let Some(wechat) = &self.wechat {
            if !(WECHAT_MIN_LEN..=WECHAT_MAX_LEN).contains(&wechat.len()) {
                return false;
            }
        }
        if let Some(alipay) = &self.alipay {
            if !(ALIPAY_MIN_LEN..=ALIPAY_MAX_LEN).contains(&alipay.len()) {
                return false;
            }
        }
        true
    }

    /// Single display handle for this recipient. Payment handles outrank
    /// email and phone.
    pub fn primary_contact(&self) -> Option<&str> {
        self.wechat
            .as_deref()
            .or(self.alipay.as_deref())
            .or(self.email.as_deref())
            .or(self.phone.as_deref())
    }
}

/// Mainland mobile format: 11 digits, leading `1`, second digit 3-9.
fn is_valid_cn_mobile(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && bytes.iter().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_contact_is_invalid() {
        assert!(!ContactInfo::new().is_valid());
    }

    #[test]
    fn test_single_valid_channel_is_enough() {
        assert!(ContactInfo::new().with_wechat("wx_user_01").is_valid());
        assert!(ContactInfo::new().with_email("user@example.com").is_valid());
        assert!(ContactInfo::new().with_phone("13812345678").is_valid());
    }

    #[test]
    fn test_one_bad_channel_spoils_the_rest() {
        let contact = ContactInfo::new()
            .with_wechat("wx_user_01")
            .with_email("not-an-email");
        assert!(!contact.is_valid());
    }

    #[test]
    fn test_phone_format() {
        assert!(is_valid_cn_mobile("13812345678"));
        assert!(is_valid_cn_mobile("19912345678"));
        // Second digit must be 3-9.
        assert!(!is_valid_cn_mobile("12812345678"));
        assert!(!is_valid_cn_mobile("1381234567"));
        assert!(!is_valid_cn_mobile("138123456789"));
        assert!(!is_valid_cn_mobile("1381234567a"));
        assert!(!is_valid_cn_mobile("23812345678"));
    }

    #[test]
    fn test_wechat_length_bounds() {
        assert!(!ContactInfo::new().with_wechat("wx01").is_valid());
        assert!(ContactInfo::new().with_wechat("wx_001").is_valid());
        assert!(!ContactInfo::new()
            .with_wechat("w".repeat(21))
            .is_valid());
    }

    #[test]
    fn test_alipay_length_bounds() {
        assert!(!ContactInfo::new().with_alipay("ali").is_valid());
        assert!(ContactInfo::new().with_alipay("alipay_account").is_valid());
        assert!(!ContactInfo::new().with_alipay("a".repeat(51)).is_valid());
    }

    #[test]
    fn test_primary_contact_prefers_payment_handles() {
        let contact = ContactInfo::new()
            .with_email("user@example.com")
            .with_phone("13812345678")
            .with_alipay("alipay_account")
            .with_wechat("wx_user_01");
        assert_eq!(contact.primary_contact(), Some("wx_user_01"));

        let contact = ContactInfo::new()
            .with_email("user@example.com")
            .with_alipay("alipay_account");
        assert_eq!(contact.primary_contact(), Some("alipay_account"));

        let contact = ContactInfo::new()
            .with_phone("13812345678")
            .with_email("user@example.com");
        assert_eq!(contact.primary_contact(), Some("user@example.com"));

        assert_eq!(ContactInfo::new().primary_contact(), None);
    }
}
