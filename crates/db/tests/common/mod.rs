//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use marketplace_core::brief::Brief;
use marketplace_core::brief_response::BriefResponse;
use marketplace_core::catalog::{Catalog, Framework};
use marketplace_core::supplier::Supplier;
use marketplace_core::types::{DbId, SupplierId, Timestamp};
use marketplace_core::user::User;
use marketplace_db::models::user::CreateUser;
use marketplace_db::repositories::{BriefRepo, BriefResponseRepo, FrameworkRepo, SupplierRepo, UserRepo};
use serde_json::{json, Value};
use sqlx::PgPool;

pub const DOS: &str = "digital-outcomes-and-specialists";

pub async fn catalog(pool: &PgPool) -> Catalog {
    FrameworkRepo::load_catalog(pool).await.unwrap()
}

pub fn dos(catalog: &Catalog) -> Arc<Framework> {
    catalog.framework(DOS).unwrap().clone()
}

pub async fn user(pool: &PgPool, email: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email_address: email.to_string(),
            name: format!("User {email}"),
            role: role.to_string(),
        },
    )
    .await
    .unwrap()
    .into()
}

pub async fn buyer(pool: &PgPool, email: &str) -> User {
    user(pool, email, "buyer").await
}

pub async fn supplier(pool: &PgPool, supplier_id: SupplierId) -> Supplier {
    SupplierRepo::create(pool, &Supplier::new(supplier_id, format!("Supplier {supplier_id}")))
        .await
        .unwrap()
}

/// An unsaved draft on the live DOS framework, lot `digital-outcomes`.
pub fn draft_brief(catalog: &Catalog, users: Vec<User>, data: Value) -> Brief {
    let framework = dos(catalog);
    let lot = framework.get_lot("digital-outcomes").unwrap().clone();
    Brief::new(framework, &lot, data, users).unwrap()
}

/// A saved brief published at `published_at`.
pub async fn published_brief(
    pool: &PgPool,
    catalog: &Catalog,
    buyer: &User,
    published_at: Timestamp,
    data: Value,
) -> Brief {
    let mut brief = draft_brief(catalog, vec![buyer.clone()], data);
    brief.set_status_at("live", published_at).unwrap();
    BriefRepo::create(pool, &mut brief).await.unwrap();
    brief
}

/// A saved brief whose application window ended weeks ago.
pub async fn closed_brief(pool: &PgPool, catalog: &Catalog, buyer: &User) -> Brief {
    published_brief(
        pool,
        catalog,
        buyer,
        Utc::now() - Duration::days(30),
        json!({"title": "Closed brief"}),
    )
    .await
}

/// A saved, submitted response.
pub async fn submitted_response(pool: &PgPool, brief_id: DbId, supplier_id: SupplierId) -> BriefResponse {
    let mut response = BriefResponse::new(brief_id, supplier_id, json!({"essentialRequirements": [true]}));
    response.submit_at(Utc::now() - Duration::days(20)).unwrap();
    BriefResponseRepo::create(pool, &mut response).await.unwrap();
    response
}
