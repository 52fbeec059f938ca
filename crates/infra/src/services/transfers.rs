//! Transfer workflow engine.
//!
//! The state machine itself lives in `depotflow-transfers`; this layer adds
//! the actor checks and the stock movement on receive, which is the only
//! transition with side effects.

use chrono::Utc;
use rand::Rng;
use tracing::{info, instrument, warn};

use depotflow_auth::{Actor, Role, ensure_location, ensure_role};
use depotflow_core::{DomainError, LocationId, TransferId};
use depotflow_transfers::{Transfer, TransferLine, TransferNumber, TransferStatus};

use super::{ServiceError, Services};

/// A request to move stock from the caller's location to another.
#[derive(Debug, Clone)]
pub struct RequestTransfer {
    pub to_location: LocationId,
    pub items: Vec<TransferLine>,
    pub notes: Option<String>,
}

impl Services {
    /// Create a pending transfer. Source stock is only *checked* here; it
    /// moves when the destination receives.
    #[instrument(skip(self, actor, request), fields(actor = %actor.id()))]
    pub async fn request_transfer(
        &self,
        actor: &Actor,
        request: RequestTransfer,
    ) -> Result<Transfer, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff])?;
        let from_location = actor
            .location()
            .ok_or_else(|| DomainError::validation("no source location assigned"))?;

        if request.items.is_empty() {
            return Err(DomainError::validation("destination and items are required").into());
        }

        self.store()
            .location(request.to_location)
            .await?
            .filter(|l| l.active)
            .ok_or_else(|| DomainError::not_found("destination location"))?;

        for line in &request.items {
            let product = self
                .store()
                .product(line.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found("product"))?;

            let on_hand = self
                .store()
                .inventory_record(line.product_id, from_location)
                .await?;
            if !on_hand.is_some_and(|r| r.has_at_least(line.quantity)) {
                return Err(DomainError::insufficient_stock(product.name).into());
            }
        }

        let now = Utc::now();
        let suffix = rand::thread_rng().gen_range(0..1000);
        let transfer = Transfer::new(
            TransferId::new(),
            TransferNumber::generate(now, suffix),
            from_location,
            request.to_location,
            request.items,
            actor.id(),
            request.notes,
            now,
        )?;

        self.store().insert_transfer(transfer.clone()).await?;
        info!(transfer_number = %transfer.transfer_number, "transfer requested");
        Ok(transfer)
    }

    /// Destination accepts a pending transfer.
    #[instrument(skip(self, actor), fields(actor = %actor.id()))]
    pub async fn approve_transfer(
        &self,
        actor: &Actor,
        transfer_id: TransferId,
    ) -> Result<Transfer, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;
        let mut transfer = self.load_transfer(transfer_id).await?;
        ensure_location(actor, transfer.to_location)?;

        transfer.approve(actor.id())?;
        self.store().update_transfer(&transfer).await?;
        info!(transfer_number = %transfer.transfer_number, "transfer approved");
        Ok(transfer)
    }

    /// Destination declines a pending transfer, with a mandatory reason.
    #[instrument(skip(self, actor, reason), fields(actor = %actor.id()))]
    pub async fn reject_transfer(
        &self,
        actor: &Actor,
        transfer_id: TransferId,
        reason: &str,
    ) -> Result<Transfer, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;
        let mut transfer = self.load_transfer(transfer_id).await?;
        ensure_location(actor, transfer.to_location)?;

        transfer.reject(reason)?;
        self.store().update_transfer(&transfer).await?;
        info!(transfer_number = %transfer.transfer_number, "transfer rejected");
        Ok(transfer)
    }

    /// Source withdraws its own pending transfer.
    #[instrument(skip(self, actor), fields(actor = %actor.id()))]
    pub async fn cancel_transfer(
        &self,
        actor: &Actor,
        transfer_id: TransferId,
    ) -> Result<Transfer, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;
        let mut transfer = self.load_transfer(transfer_id).await?;
        ensure_location(actor, transfer.from_location)?;

        transfer.cancel()?;
        self.store().update_transfer(&transfer).await?;
        info!(transfer_number = %transfer.transfer_number, "transfer cancelled");
        Ok(transfer)
    }

    /// Destination receives an approved transfer: per line, decrement the
    /// source atomically and credit the destination (creating the record with
    /// default thresholds when absent). Insufficient source stock at receive
    /// time fails the whole receive after taking back lines already moved.
    #[instrument(skip(self, actor), fields(actor = %actor.id()))]
    pub async fn receive_transfer(
        &self,
        actor: &Actor,
        transfer_id: TransferId,
    ) -> Result<Transfer, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff, Role::Admin])?;
        let mut transfer = self.load_transfer(transfer_id).await?;
        ensure_location(actor, transfer.to_location)?;

        if transfer.status != TransferStatus::Approved {
            return Err(DomainError::invalid_state(format!(
                "cannot receive a transfer that is {}",
                transfer.status
            ))
            .into());
        }

        let now = Utc::now();
        let mut moved: Vec<TransferLine> = Vec::new();

        for line in &transfer.items {
            let taken = self
                .store()
                .try_decrement_stock(line.product_id, transfer.from_location, line.quantity, now)
                .await?;

            if !taken {
                self.unwind_receive(&transfer, &moved).await?;
                let name = self
                    .store()
                    .product(line.product_id)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_else(|| line.product_id.to_string());
                return Err(DomainError::insufficient_stock(name).into());
            }

            self.store()
                .increment_stock(line.product_id, transfer.to_location, line.quantity, now)
                .await?;
            moved.push(line.clone());
        }

        transfer.complete(now)?;
        self.store().update_transfer(&transfer).await?;
        info!(transfer_number = %transfer.transfer_number, "transfer completed");
        Ok(transfer)
    }

    /// Transfers where the caller's location is source or destination.
    pub async fn my_transfers(&self, actor: &Actor) -> Result<Vec<Transfer>, ServiceError> {
        ensure_role(actor, &[Role::LocationStaff])?;
        let location = actor
            .location()
            .ok_or_else(|| DomainError::validation("actor has no location binding"))?;
        Ok(self.store().transfers_touching(location).await?)
    }

    async fn load_transfer(&self, transfer_id: TransferId) -> Result<Transfer, ServiceError> {
        Ok(self
            .store()
            .transfer(transfer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("transfer"))?)
    }

    /// Take back lines already moved by a failing receive. Best-effort: if a
    /// concurrent order consumed the destination credit in the meantime the
    /// source restore is skipped to keep total stock conserved.
    async fn unwind_receive(
        &self,
        transfer: &Transfer,
        moved: &[TransferLine],
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        for line in moved {
            let recovered = self
                .store()
                .try_decrement_stock(line.product_id, transfer.to_location, line.quantity, now)
                .await?;
            if recovered {
                self.store()
                    .increment_stock(line.product_id, transfer.from_location, line.quantity, now)
                    .await?;
            } else {
                warn!(
                    transfer_number = %transfer.transfer_number,
                    product = %line.product_id,
                    "destination credit already consumed; skipping source restore"
                );
            }
        }
        Ok(())
    }
}
