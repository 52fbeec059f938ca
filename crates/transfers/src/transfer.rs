use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depotflow_core::{DomainError, DomainResult, LocationId, ProductId, TransferId, UserId};

/// Human-facing transfer number: `TRF-<unix millis>-<3-digit suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferNumber(String);

impl TransferNumber {
    pub fn generate(now: DateTime<Utc>, suffix: u32) -> Self {
        Self(format!("TRF-{}-{:03}", now.timestamp_millis(), suffix % 1000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for TransferNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TransferNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl core::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One product line of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A stock transfer request between two locations.
///
/// Lifecycle: source staff create it `pending`; destination staff approve or
/// reject; the source may cancel while still pending; destination staff
/// *receive* an approved transfer, which is the only point stock moves and the
/// transition to `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub transfer_number: TransferNumber,
    pub from_location: LocationId,
    pub to_location: LocationId,
    pub items: Vec<TransferLine>,
    pub status: TransferStatus,
    pub requested_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserId>,
    pub request_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Transfer {
    pub fn new(
        id: TransferId,
        transfer_number: TransferNumber,
        from_location: LocationId,
        to_location: LocationId,
        items: Vec<TransferLine>,
        requested_by: UserId,
        notes: Option<String>,
        request_date: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if from_location == to_location {
            return Err(DomainError::validation(
                "source and destination locations must differ",
            ));
        }
        if items.is_empty() {
            return Err(DomainError::validation("transfer must contain at least one line"));
        }
        if items.iter().any(|l| l.quantity <= 0) {
            return Err(DomainError::validation("transfer quantities must be positive"));
        }

        Ok(Self {
            id,
            transfer_number,
            from_location,
            to_location,
            items,
            status: TransferStatus::Pending,
            requested_by,
            approved_by: None,
            request_date,
            completion_date: None,
            notes,
            rejection_reason: None,
        })
    }

    fn expect_status(&self, expected: TransferStatus, operation: &str) -> DomainResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "cannot {operation} a transfer that is {}",
                self.status
            )))
        }
    }

    /// Destination accepts the request. Stock does not move yet.
    pub fn approve(&mut self, approved_by: UserId) -> DomainResult<()> {
        self.expect_status(TransferStatus::Pending, "approve")?;
        self.status = TransferStatus::Approved;
        self.approved_by = Some(approved_by);
        Ok(())
    }

    /// Destination declines the request; a reason is mandatory.
    pub fn reject(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.expect_status(TransferStatus::Pending, "reject")?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason cannot be empty"));
        }
        self.status = TransferStatus::Rejected;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Source withdraws the request before the destination has decided.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.expect_status(TransferStatus::Pending, "cancel")?;
        self.status = TransferStatus::Cancelled;
        Ok(())
    }

    /// Destination receives the goods; only legal from `approved`. The caller
    /// moves the stock.
    pub fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.expect_status(TransferStatus::Approved, "receive")?;
        self.status = TransferStatus::Completed;
        self.completion_date = Some(now);
        Ok(())
    }
}
