//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings, resource kinds as their stored names with an ASSERT
//! constraint.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Resources (one row per tree node)
-- =======================================================================
DEFINE TABLE resource SCHEMAFULL;
DEFINE FIELD parent_id ON TABLE resource TYPE option<string>;
DEFINE FIELD order_number ON TABLE resource TYPE int DEFAULT 0;
DEFINE FIELD kind ON TABLE resource TYPE string \
    ASSERT $value IN ['ROOT', 'CONTENT_VERSION', 'INTRO', 'LANGUAGE', \
    'MENU', 'PAGE', 'SLIDESHOW', 'SLIDESHOW_PDF', 'TEXT', 'IMAGE', \
    'VIDEO', 'PDF', 'APPLICATION_ICON'];
DEFINE FIELD name ON TABLE resource TYPE string;
DEFINE FIELD slug ON TABLE resource TYPE string;
DEFINE FIELD payload ON TABLE resource TYPE option<string>;
DEFINE FIELD external_authorization_id ON TABLE resource TYPE string;
DEFINE FIELD created_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE resource TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD creator_id ON TABLE resource TYPE string;
DEFINE FIELD last_modifier_id ON TABLE resource TYPE string;
DEFINE INDEX idx_resource_parent ON TABLE resource \
    COLUMNS parent_id, order_number;

-- =======================================================================
-- Resource properties (per-resource key/value)
-- =======================================================================
DEFINE TABLE resource_property SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE resource_property TYPE string;
DEFINE FIELD entry_key ON TABLE resource_property TYPE string;
DEFINE FIELD entry_value ON TABLE resource_property TYPE string;
DEFINE FIELD created_at ON TABLE resource_property TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE resource_property TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD creator_id ON TABLE resource_property TYPE string;
DEFINE FIELD last_modifier_id ON TABLE resource_property TYPE string;
DEFINE INDEX idx_resource_property_key ON TABLE resource_property \
    COLUMNS owner_id, entry_key UNIQUE;

-- =======================================================================
-- Resource styles (per-resource key/value)
-- =======================================================================
DEFINE TABLE resource_style SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE resource_style TYPE string;
DEFINE FIELD entry_key ON TABLE resource_style TYPE string;
DEFINE FIELD entry_value ON TABLE resource_style TYPE string;
DEFINE FIELD created_at ON TABLE resource_style TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE resource_style TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD creator_id ON TABLE resource_style TYPE string;
DEFINE FIELD last_modifier_id ON TABLE resource_style TYPE string;
DEFINE INDEX idx_resource_style_key ON TABLE resource_style \
    COLUMNS owner_id, entry_key UNIQUE;

-- =======================================================================
-- Device metas (per-device key/value)
-- =======================================================================
DEFINE TABLE device_meta SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE device_meta TYPE string;
DEFINE FIELD entry_key ON TABLE device_meta TYPE string;
DEFINE FIELD entry_value ON TABLE device_meta TYPE string;
DEFINE FIELD created_at ON TABLE device_meta TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD modified_at ON TABLE device_meta TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD creator_id ON TABLE device_meta TYPE string;
DEFINE FIELD last_modifier_id ON TABLE device_meta TYPE string;
DEFINE INDEX idx_device_meta_key ON TABLE device_meta \
    COLUMNS owner_id, entry_key UNIQUE;

-- =======================================================================
-- Protected resources (authorization registry entries)
-- =======================================================================
DEFINE TABLE protected_resource SCHEMAFULL;
DEFINE FIELD uri ON TABLE protected_resource TYPE string;
DEFINE FIELD name ON TABLE protected_resource TYPE string;
DEFINE FIELD resource_type ON TABLE protected_resource TYPE string;
DEFINE FIELD scopes ON TABLE protected_resource TYPE array<string>;
DEFINE FIELD owner_id ON TABLE protected_resource TYPE string;
DEFINE FIELD owner_managed_access ON TABLE protected_resource TYPE bool \
    DEFAULT true;
DEFINE FIELD created_at ON TABLE protected_resource TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_protected_resource_uri ON TABLE protected_resource \
    COLUMNS uri UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Applies every migration newer than the recorded schema version.
///
/// The `_migration` table is defined on first use and gets one row per
/// applied version. Safe to call on every start-up: versions at or below
/// the recorded maximum are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Tracking table first, so the version lookup below never fails.
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        // Recorded separately: a failure here re-runs the DEFINEs next time.
        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use canopy_core::models::resource::ResourceKind;

    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn every_resource_kind_is_allowed_by_the_schema() {
        for kind in ResourceKind::ALL {
            let quoted = format!("'{}'", kind.as_str());
            assert!(SCHEMA_V1.contains(&quoted), "schema rejects kind {kind}");
        }
    }
}
