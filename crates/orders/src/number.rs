use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Human-facing order number: `ORD-<unix millis>-<3-digit suffix>`.
///
/// Uniqueness is best-effort (timestamp plus a random suffix supplied by the
/// caller); the store additionally rejects duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

/// Invoice number issued alongside the order: `INV-<unix millis>-<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

macro_rules! impl_document_number {
    ($t:ty, $prefix:literal) => {
        impl $t {
            /// Format a number from a timestamp and a caller-supplied random
            /// suffix. Keeping the randomness outside makes this deterministic
            /// and easy to test.
            pub fn generate(now: DateTime<Utc>, suffix: u32) -> Self {
                Self(format!(
                    "{}-{}-{:03}",
                    $prefix,
                    now.timestamp_millis(),
                    suffix % 1000
                ))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

impl_document_number!(OrderNumber, "ORD");
impl_document_number!(InvoiceNumber, "INV");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_number_format_is_stable() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let n = OrderNumber::generate(at, 7);
        assert_eq!(n.as_str(), "ORD-1700000000000-007");
    }

    #[test]
    fn suffix_is_clamped_to_three_digits() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let n = InvoiceNumber::generate(at, 123_456);
        assert_eq!(n.as_str(), "INV-1700000000000-456");
    }
}
