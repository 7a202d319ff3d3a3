//! Database migrations
//!
//! Each step is keyed by the version it upgrades from and runs in a single
//! transaction together with the version bump, so an interrupted open never
//! leaves records half-migrated.

use crate::error::Result;
use libsql::Connection;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

struct MigrationStep {
    from: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

impl MigrationStep {
    const fn to(&self) -> i32 {
        self.from + 1
    }
}

const STEPS: &[MigrationStep] = &[
    MigrationStep {
        from: 0,
        description: "offline queue table",
        statements: &[
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            // Version 1 stored `synced` as a boolean ('true'/'false')
            "CREATE TABLE IF NOT EXISTS offline_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                synced NOT NULL DEFAULT 'false'
            )",
            "CREATE INDEX IF NOT EXISTS idx_offline_queue_timestamp ON offline_queue(timestamp)",
            "CREATE INDEX IF NOT EXISTS idx_offline_queue_synced ON offline_queue(synced)",
        ],
    },
    MigrationStep {
        from: 1,
        description: "numeric sync state",
        statements: &[
            "DROP INDEX IF EXISTS idx_offline_queue_synced",
            "UPDATE offline_queue SET synced = CASE
                WHEN typeof(synced) IN ('integer', 'real') THEN (synced != 0)
                WHEN lower(trim(synced)) IN ('true', '1', 'yes') THEN 1
                ELSE 0
             END
             WHERE typeof(synced) != 'integer' OR synced NOT IN (0, 1)",
            "CREATE INDEX IF NOT EXISTS idx_offline_queue_synced ON offline_queue(synced)",
        ],
    },
];

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    migrate_to(conn, CURRENT_VERSION).await
}

/// Apply steps until the store reaches `target`
pub(crate) async fn migrate_to(conn: &Connection, target: i32) -> Result<()> {
    let version = get_version(conn).await?;

    for step in STEPS {
        if step.from < version || step.to() > target {
            continue;
        }
        apply(conn, step).await?;
    }

    Ok(())
}

/// Get the current schema version
pub(crate) async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Apply one step, unless another connection already did.
///
/// The version is re-read under the write lock; a step whose `from` no
/// longer matches commits as a no-op.
async fn apply(conn: &Connection, step: &MigrationStep) -> Result<bool> {
    conn.execute("BEGIN IMMEDIATE TRANSACTION", ()).await?;

    let version = match get_version(conn).await {
        Ok(version) => version,
        Err(e) => {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }
    };
    if version != step.from {
        conn.execute("COMMIT", ()).await?;
        tracing::debug!(
            "Offline queue already past version {} (at {version})",
            step.from
        );
        return Ok(false);
    }

    for stmt in step.statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            libsql::params![i64::from(step.to())],
        )
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!(
        "Migrated offline queue to version {} ({})",
        step.to(),
        step.description
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;
    use pretty_assertions::assert_eq;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    async fn synced_column(conn: &Connection) -> Vec<(i64, String, String)> {
        let mut rows = conn
            .query(
                "SELECT id, typeof(synced), CAST(synced AS TEXT) FROM offline_queue ORDER BY id",
                (),
            )
            .await
            .unwrap();
        let mut values = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            values.push((
                row.get::<i64>(0).unwrap(),
                row.get::<String>(1).unwrap(),
                row.get::<String>(2).unwrap(),
            ));
        }
        values
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrate_to_stops_at_target() {
        let conn = setup().await;
        migrate_to(&conn, 1).await.unwrap();
        assert_eq!(get_version(&conn).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn step_already_applied_elsewhere_is_skipped() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        // A connection that read version 0 before another one migrated
        assert!(!apply(&conn, &STEPS[0]).await.unwrap());
        assert!(!apply(&conn, &STEPS[1]).await.unwrap());
        assert_eq!(get_version(&conn).await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn legacy_boolean_sync_state_is_normalized() {
        let conn = setup().await;
        migrate_to(&conn, 1).await.unwrap();

        for synced in ["'true'", "'false'", "'TRUE'", "1", "0", "2"] {
            conn.execute(
                &format!(
                    "INSERT INTO offline_queue (data, timestamp, synced) VALUES ('{{}}', 1, {synced})"
                ),
                (),
            )
            .await
            .unwrap();
        }

        run(&conn).await.unwrap();

        let expected = [1, 0, 1, 1, 0, 1]
            .iter()
            .zip(1_i64..)
            .map(|(value, id)| (id, "integer".to_string(), value.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(synced_column(&conn).await, expected);

        run(&conn).await.unwrap();
        assert_eq!(synced_column(&conn).await, expected);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn synced_index_exists_after_upgrade() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let mut rows = conn
            .query(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master
                    WHERE type = 'index' AND name = 'idx_offline_queue_synced'
                )",
                (),
            )
            .await
            .unwrap();

        let exists = rows
            .next()
            .await
            .unwrap()
            .is_some_and(|row| row.get::<i32>(0).unwrap() != 0);

        assert!(exists);
    }
}
