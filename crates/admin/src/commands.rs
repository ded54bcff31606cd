//! Subcommand implementations. Results go to stdout as JSON; logs go to stderr.

use anyhow::Context;
use marketplace_core::brief::BriefStatus;
use marketplace_core::render::BaseUrlLinks;
use marketplace_core::types::DbId;
use marketplace_db::models::brief::BriefFilter;
use marketplace_db::models::DerivedStatusRow;
use marketplace_db::repositories::{
    BriefRepo, BriefResponseRepo, FrameworkAgreementRepo, FrameworkRepo,
};
use marketplace_db::DbPool;
use serde_json::json;

use crate::config::AdminConfig;

pub async fn migrate(pool: &DbPool) -> anyhow::Result<()> {
    marketplace_db::run_migrations(pool)
        .await
        .context("failed to apply migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

pub async fn list_briefs(
    pool: &DbPool,
    config: &AdminConfig,
    statuses: Vec<BriefStatus>,
    framework_slugs: Vec<String>,
) -> anyhow::Result<()> {
    let catalog = FrameworkRepo::load_catalog(pool)
        .await
        .context("failed to load framework catalog")?;
    let filter = BriefFilter {
        statuses,
        framework_slugs,
        ..Default::default()
    };
    let briefs = BriefRepo::list(pool, &catalog, &filter)
        .await
        .context("failed to list briefs")?;

    let links = BaseUrlLinks::new(config.api_base_url.as_str());
    let rendered: Vec<_> = briefs.iter().map(|brief| brief.serialize(&links)).collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "briefs": rendered }))?);
    Ok(())
}

pub async fn copy_brief(pool: &DbPool, config: &AdminConfig, id: DbId) -> anyhow::Result<()> {
    let catalog = FrameworkRepo::load_catalog(pool)
        .await
        .context("failed to load framework catalog")?;
    let copy = BriefRepo::copy(pool, &catalog, id)
        .await
        .with_context(|| format!("failed to copy brief {id}"))?;

    let links = BaseUrlLinks::new(config.api_base_url.as_str());
    println!("{}", serde_json::to_string_pretty(&json!({ "brief": copy.serialize(&links) }))?);
    Ok(())
}

/// Compare the status each SQL predicate derives with the status the
/// loaded entity reports. Fails if any row disagrees.
pub async fn verify_statuses(pool: &DbPool) -> anyhow::Result<()> {
    let catalog = FrameworkRepo::load_catalog(pool)
        .await
        .context("failed to load framework catalog")?;
    let mut mismatches = Vec::new();

    for row in BriefRepo::derived_statuses(pool).await? {
        let brief = BriefRepo::find_by_id(pool, &catalog, row.id).await?;
        let derived = brief.map(|brief| brief.status().as_str());
        check("brief", &row, derived, &mut mismatches);
    }

    for row in BriefResponseRepo::derived_statuses(pool).await? {
        let response = BriefResponseRepo::find_by_id(pool, row.id).await?;
        let derived = response.map(|response| response.status().as_str());
        check("brief response", &row, derived, &mut mismatches);
    }

    for row in FrameworkAgreementRepo::derived_statuses(pool).await? {
        let agreement = FrameworkAgreementRepo::find_by_id(pool, row.id).await?;
        let derived = agreement.map(|agreement| agreement.status().as_str());
        check("framework agreement", &row, derived, &mut mismatches);
    }

    println!("{}", serde_json::to_string_pretty(&json!({ "mismatches": mismatches }))?);
    if !mismatches.is_empty() {
        anyhow::bail!("{} rows disagree with their SQL status", mismatches.len());
    }
    tracing::info!("All derived statuses agree");
    Ok(())
}

fn check(
    entity: &str,
    row: &DerivedStatusRow,
    derived: Option<&str>,
    mismatches: &mut Vec<serde_json::Value>,
) {
    if derived == Some(row.status.as_str()) {
        return;
    }
    // A row deleted between the two reads shows up with a null status.
    tracing::warn!(entity, id = row.id, sql = %row.status, derived = ?derived, "Status mismatch");
    mismatches.push(json!({
        "entity": entity,
        "id": row.id,
        "sql": row.status,
        "derived": derived,
    }));
}
