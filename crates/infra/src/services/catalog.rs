//! Catalog maintenance (reference data CRUD).

use chrono::Utc;
use tracing::{info, instrument};

use depotflow_auth::{Actor, Role, ensure_role};
use depotflow_catalog::{Location, Product};
use depotflow_core::{LocationId, ProductId};

use super::{ServiceError, Services};

/// Admin request to add a product to the catalog.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub price: u64,
    pub category: String,
}

/// Admin request to register a location.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: String,
    pub region: String,
}

impl Services {
    #[instrument(skip(self, actor, request), fields(actor = %actor.id()))]
    pub async fn create_product(
        &self,
        actor: &Actor,
        request: NewProduct,
    ) -> Result<Product, ServiceError> {
        ensure_role(actor, &[Role::Admin])?;

        let product = Product::new(
            ProductId::new(),
            request.name,
            request.description,
            request.unit,
            request.price,
            request.category,
            Utc::now(),
        )?;

        self.store().insert_product(product.clone()).await?;
        info!(product = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store().active_products().await?)
    }

    #[instrument(skip(self, actor, request), fields(actor = %actor.id()))]
    pub async fn create_location(
        &self,
        actor: &Actor,
        request: NewLocation,
    ) -> Result<Location, ServiceError> {
        ensure_role(actor, &[Role::Admin])?;

        let location = Location::new(LocationId::new(), request.name, request.region, Utc::now())?;

        self.store().insert_location(location.clone()).await?;
        info!(location = %location.id, name = %location.name, "location created");
        Ok(location)
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, ServiceError> {
        Ok(self.store().active_locations().await?)
    }
}
