//! Repository for the `suppliers` and `contact_information` tables.

use marketplace_core::supplier::{ContactInformation, Supplier};
use marketplace_core::types::SupplierId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::supplier::{ContactInformationRow, SupplierRow};

/// Column list for the `suppliers` table.
const COLUMNS: &str = "id, supplier_id, name, description, clients, duns_number, esourcing_id, \
    companies_house_number, registered_name, registration_country, \
    other_company_registration_number, registration_date, vat_number, organisation_size, \
    trading_status, company_details_confirmed, created_at, updated_at";

/// Column list for the `contact_information` table.
const CONTACT_COLUMNS: &str =
    "id, supplier_id, contact_name, email, postcode, phone_number, website, address1, city";

/// Provides persistence for suppliers and their contacts.
pub struct SupplierRepo;

impl SupplierRepo {
    /// Insert a supplier together with its contact records.
    pub async fn create(pool: &PgPool, supplier: &Supplier) -> Result<Supplier, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO suppliers \
                (supplier_id, name, description, clients, duns_number, esourcing_id, \
                 companies_house_number, registered_name, registration_country, \
                 other_company_registration_number, registration_date, vat_number, \
                 organisation_size, trading_status, company_details_confirmed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SupplierRow>(&query)
            .bind(supplier.supplier_id)
            .bind(&supplier.name)
            .bind(&supplier.description)
            .bind(Json(&supplier.clients))
            .bind(&supplier.duns_number)
            .bind(&supplier.esourcing_id)
            .bind(&supplier.companies_house_number)
            .bind(&supplier.registered_name)
            .bind(&supplier.registration_country)
            .bind(&supplier.other_company_registration_number)
            .bind(supplier.registration_date)
            .bind(&supplier.vat_number)
            .bind(&supplier.organisation_size)
            .bind(&supplier.trading_status)
            .bind(supplier.company_details_confirmed)
            .fetch_one(&mut *tx)
            .await?;

        let mut contacts = Vec::with_capacity(supplier.contact_information.len());
        for contact in &supplier.contact_information {
            contacts.push(Self::insert_contact(&mut tx, row.supplier_id, contact).await?);
        }

        tx.commit().await?;
        Ok(row.into_supplier(contacts))
    }

    /// Find a supplier by its external id, with contacts in creation order.
    pub async fn find_by_supplier_id(
        pool: &PgPool,
        supplier_id: SupplierId,
    ) -> Result<Option<Supplier>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM suppliers WHERE supplier_id = $1");
        let row = sqlx::query_as::<_, SupplierRow>(&query)
            .bind(supplier_id)
            .fetch_optional(pool)
            .await?;
        match row {
            Some(row) => {
                let contacts = Self::list_contact_information(pool, supplier_id).await?;
                Ok(Some(row.into_supplier(contacts)))
            }
            None => Ok(None),
        }
    }

    /// Write back the supplier's own fields. Contacts are not touched.
    pub async fn save(pool: &PgPool, supplier: &Supplier) -> Result<Supplier, DbError> {
        let query = format!(
            "UPDATE suppliers SET \
                name = $2, description = $3, clients = $4, duns_number = $5, \
                esourcing_id = $6, companies_house_number = $7, registered_name = $8, \
                registration_country = $9, other_company_registration_number = $10, \
                registration_date = $11, vat_number = $12, organisation_size = $13, \
                trading_status = $14, company_details_confirmed = $15 \
             WHERE supplier_id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SupplierRow>(&query)
            .bind(supplier.supplier_id)
            .bind(&supplier.name)
            .bind(&supplier.description)
            .bind(Json(&supplier.clients))
            .bind(&supplier.duns_number)
            .bind(&supplier.esourcing_id)
            .bind(&supplier.companies_house_number)
            .bind(&supplier.registered_name)
            .bind(&supplier.registration_country)
            .bind(&supplier.other_company_registration_number)
            .bind(supplier.registration_date)
            .bind(&supplier.vat_number)
            .bind(&supplier.organisation_size)
            .bind(&supplier.trading_status)
            .bind(supplier.company_details_confirmed)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::not_found("supplier", supplier.supplier_id))?;

        let contacts = Self::list_contact_information(pool, supplier.supplier_id).await?;
        Ok(row.into_supplier(contacts))
    }

    pub async fn add_contact_information(
        pool: &PgPool,
        contact: &ContactInformation,
    ) -> Result<ContactInformation, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert_contact(&mut conn, contact.supplier_id, contact).await
    }

    pub async fn list_contact_information(
        pool: &PgPool,
        supplier_id: SupplierId,
    ) -> Result<Vec<ContactInformation>, sqlx::Error> {
        let query = format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_information \
             WHERE supplier_id = $1 \
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ContactInformationRow>(&query)
            .bind(supplier_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(ContactInformation::from).collect())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn insert_contact(
        conn: &mut PgConnection,
        supplier_id: SupplierId,
        contact: &ContactInformation,
    ) -> Result<ContactInformation, sqlx::Error> {
        let query = format!(
            "INSERT INTO contact_information \
                (supplier_id, contact_name, email, postcode, phone_number, website, address1, city) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContactInformationRow>(&query)
            .bind(supplier_id)
            .bind(&contact.contact_name)
            .bind(&contact.email)
            .bind(&contact.postcode)
            .bind(&contact.phone_number)
            .bind(&contact.website)
            .bind(&contact.address1)
            .bind(&contact.city)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }
}
