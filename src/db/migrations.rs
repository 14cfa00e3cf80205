use anyhow::Context;
use rusqlite::Connection;

/// Migrations are compiled in so every connection (including the
/// in-memory databases used by tests) sees the same authoritative
/// schema, in order, exactly once.
const MIGRATIONS: &[(&str, &str)] = &[("001_init.sql", include_str!("../../migrations/001_init.sql"))];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db;

    #[test]
    fn migrations_are_idempotent() {
        let conn = db::init_db(":memory:").unwrap();
        // A second pass must be a no-op, not a constraint error.
        super::run_migrations(&conn).unwrap();

        let services: i64 = conn
            .query_row("SELECT COUNT(*) FROM services", [], |row| row.get(0))
            .unwrap();
        assert!(services > 0, "service catalog should be seeded");
    }
}
