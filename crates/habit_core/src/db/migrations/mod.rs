//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register the habit/entry schema migrations in strictly increasing order.
//! - Apply each pending migration inside its own transaction.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A failed migration leaves earlier ones committed and itself rolled back.
//! - A database newer than this binary is rejected, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "habits",
        sql: include_str!("0001_habits.sql"),
    },
    Migration {
        version: 2,
        name: "entry_day_unique",
        sql: include_str!("0002_entry_day_unique.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Returns the number of migrations applied (`0` when already current).
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    apply_pending(conn, MIGRATIONS)
}

fn apply_pending(conn: &mut Connection, migrations: &[Migration]) -> DbResult<usize> {
    let current_version = current_user_version(conn)?;
    let latest = migrations.last().map_or(0, |migration| migration.version);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let mut applied = 0;
    for migration in migrations {
        if migration.version <= current_version {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=applied version={} name={}",
            migration.version, migration.name
        );
        applied += 1;
    }

    Ok(applied)
}

/// Reads the schema version currently recorded in the database.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_pending, current_user_version, latest_version, Migration, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        let mut previous = 0;
        for migration in MIGRATIONS {
            assert!(
                migration.version > previous,
                "migration {} is out of order",
                migration.name
            );
            previous = migration.version;
        }
        assert_eq!(latest_version(), previous);
    }

    #[test]
    fn failed_migration_keeps_earlier_versions_committed() {
        let steps = [
            Migration {
                version: 1,
                name: "first",
                sql: "CREATE TABLE first (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE second (id INTEGER PRIMARY KEY); INSERT INTO missing VALUES (1);",
            },
        ];
        let mut conn = Connection::open_in_memory().unwrap();

        let err = apply_pending(&mut conn, &steps).unwrap_err();
        assert!(matches!(
            err,
            DbError::Migration {
                version: 2,
                name: "broken",
                ..
            }
        ));
        assert_eq!(current_user_version(&conn).unwrap(), 1);

        let second_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'second';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(second_exists, 0);
    }
}
