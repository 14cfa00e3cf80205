pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

/// Open (or create) the appointment store and bring the schema up to
/// date. WAL plus a busy timeout keeps concurrent server processes on a
/// shared database file from failing fast on a locked write; the slot
/// uniqueness guarantee itself lives in the schema, not here.
pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )
    .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
