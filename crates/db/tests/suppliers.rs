//! Integration tests for suppliers and contact information.

use chrono::NaiveDate;
use marketplace_core::render::BaseUrlLinks;
use marketplace_core::supplier::{ContactInformation, Supplier};
use marketplace_db::repositories::SupplierRepo;
use marketplace_db::DbError;
use serde_json::json;
use sqlx::PgPool;

fn contact(supplier_id: i64, name: &str) -> ContactInformation {
    ContactInformation {
        id: None,
        supplier_id,
        contact_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        postcode: "SW1A 1AA".to_string(),
        phone_number: Some("020 7946 0000".to_string()),
        website: None,
        address1: None,
        city: Some("London".to_string()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find_supplier(pool: PgPool) {
    let mut supplier = Supplier::new(300, "Tape and String");
    supplier.clients = vec!["Parcel Wrappers Ltd".to_string()];
    supplier.contact_information.push(contact(300, "Alex"));

    let created = SupplierRepo::create(&pool, &supplier).await.unwrap();
    assert!(created.id.is_some());
    assert_eq!(created.contact_information.len(), 1);
    assert!(created.contact_information[0].id.is_some());

    let found = SupplierRepo::find_by_supplier_id(&pool, 300).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert!(SupplierRepo::find_by_supplier_id(&pool, 301).await.unwrap().is_none());

    let rendered = found.serialize(&BaseUrlLinks::new("http://api.test"));
    assert_eq!(rendered["clients"], json!(["Parcel Wrappers Ltd"]));
    assert_eq!(rendered["contactInformation"][0]["city"], "London");
    assert!(rendered.get("dunsNumber").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_from_json_and_save(pool: PgPool) {
    let mut supplier = SupplierRepo::create(&pool, &Supplier::new(310, "Before"))
        .await
        .unwrap();

    supplier
        .update_from_json(&json!({
            "supplierId": 999,
            "name": "After",
            "registrationDate": "1973-08-10",
            "companyDetailsConfirmed": true,
        }))
        .unwrap();
    let saved = SupplierRepo::save(&pool, &supplier).await.unwrap();

    assert_eq!(saved.supplier_id, 310);
    assert_eq!(saved.name, "After");
    assert_eq!(saved.registration_date, NaiveDate::from_ymd_opt(1973, 8, 10));
    assert!(saved.company_details_confirmed);

    let unknown = Supplier::new(311, "Nobody");
    let err = SupplierRepo::save(&pool, &unknown).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "supplier", .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_contact_information(pool: PgPool) {
    SupplierRepo::create(&pool, &Supplier::new(320, "Contacts"))
        .await
        .unwrap();

    let first = SupplierRepo::add_contact_information(&pool, &contact(320, "First"))
        .await
        .unwrap();
    let second = SupplierRepo::add_contact_information(&pool, &contact(320, "Second"))
        .await
        .unwrap();
    assert!(first.id < second.id);

    let contacts = SupplierRepo::list_contact_information(&pool, 320).await.unwrap();
    let names: Vec<&str> = contacts.iter().map(|c| c.contact_name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);

    // Contacts cannot be attached to an unknown supplier.
    assert!(SupplierRepo::add_contact_information(&pool, &contact(321, "Orphan"))
        .await
        .is_err());
}
