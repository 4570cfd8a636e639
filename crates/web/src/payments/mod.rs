//! Outbound clients for the payment providers and the bookkeeping shared by
//! both of them.

pub mod paypal;
pub mod stripe;

use uuid::Uuid;

pub use paypal::PayPalClient;
pub use stripe::StripeClient;

/// What a checkout pays for, carried through the provider round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPurpose {
    Credits { user_id: Uuid, credits: i64 },
    CompetitionEntry { user_id: Uuid, registration_id: Uuid },
}

impl CheckoutPurpose {
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Credits { user_id, .. } | Self::CompetitionEntry { user_id, .. } => *user_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Credits { .. } => "credits",
            Self::CompetitionEntry { .. } => "competition_entry",
        }
    }

    /// Compact form that fits PayPal's 127 character `custom_id`
    pub fn to_custom_id(&self) -> String {
        match self {
            Self::Credits { user_id, credits } => format!("credits:{}:{}", user_id, credits),
            Self::CompetitionEntry {
                user_id,
                registration_id,
            } => format!("entry:{}:{}", user_id, registration_id),
        }
    }

    pub fn from_custom_id(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, ':');
        let kind = parts.next()?;
        let user_id = parts.next()?.parse().ok()?;
        let rest = parts.next()?;

        match kind {
            "credits" => Some(Self::Credits {
                user_id,
                credits: rest.parse().ok()?,
            }),
            "entry" => Some(Self::CompetitionEntry {
                user_id,
                registration_id: rest.parse().ok()?,
            }),
            _ => None,
        }
    }

    /// Key/value pairs stored as Stripe session metadata
    pub fn to_metadata(&self) -> Vec<(&'static str, String)> {
        let mut metadata = vec![
            ("kind", self.kind().to_string()),
            ("user_id", self.user_id().to_string()),
        ];
        match self {
            Self::Credits { credits, .. } => metadata.push(("credits", credits.to_string())),
            Self::CompetitionEntry {
                registration_id, ..
            } => metadata.push(("registration_id", registration_id.to_string())),
        }
        metadata
    }

    pub fn from_metadata(metadata: &std::collections::HashMap<String, String>) -> Option<Self> {
        let user_id = metadata.get("user_id")?.parse().ok()?;
        match metadata.get("kind")?.as_str() {
            "credits" => Some(Self::Credits {
                user_id,
                credits: metadata.get("credits")?.parse().ok()?,
            }),
            "competition_entry" => Some(Self::CompetitionEntry {
                user_id,
                registration_id: metadata.get("registration_id")?.parse().ok()?,
            }),
            _ => None,
        }
    }
}

/// Format a cent amount the way PayPal expects ("12.50")
pub fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_custom_id_round_trip() {
        let purpose = CheckoutPurpose::CompetitionEntry {
            user_id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
        };
        let encoded = purpose.to_custom_id();
        assert!(encoded.len() <= 127);
        assert_eq!(CheckoutPurpose::from_custom_id(&encoded), Some(purpose));
    }

    #[test]
    fn test_custom_id_rejects_garbage() {
        assert_eq!(CheckoutPurpose::from_custom_id("credits:not-a-uuid:5"), None);
        assert_eq!(CheckoutPurpose::from_custom_id("refund:x"), None);
        assert_eq!(CheckoutPurpose::from_custom_id(""), None);
    }

    #[test]
    fn test_metadata_parsing() {
        let user_id = Uuid::new_v4();
        let metadata: HashMap<String, String> = CheckoutPurpose::Credits {
            user_id,
            credits: 20,
        }
        .to_metadata()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        assert_eq!(
            CheckoutPurpose::from_metadata(&metadata),
            Some(CheckoutPurpose::Credits {
                user_id,
                credits: 20
            })
        );
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(1250), "12.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(100_000), "1000.00");
    }
}
