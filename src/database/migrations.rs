use crate::error::AppError;
use sqlx::{Connection, Pool, Row, Sqlite, SqliteConnection};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Target definition of `students`, used when a legacy table has to be
/// rebuilt. Must match the embedded migration.
const STUDENTS_TABLE: &str = "CREATE TABLE students_migration_new (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lrn TEXT NOT NULL,
    full_name TEXT NOT NULL,
    email TEXT,
    contact TEXT,
    address TEXT,
    dob TEXT,
    pob TEXT,
    sex TEXT,
    nationality TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const STUDENTS_INDICES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_students_lrn ON students (lrn)",
    "CREATE INDEX IF NOT EXISTS idx_students_full_name ON students (full_name)",
];

#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    /// `c` for CREATE INDEX, `u` for a UNIQUE constraint, `pk` for a primary key.
    pub origin: String,
}

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;

    if drop_unique_lrn_constraint(pool).await? {
        info!("Removed legacy uniqueness constraint on students.lrn");
    }

    info!("Migrations completed successfully");
    Ok(())
}

/// Unique single-column indices over `students.lrn`.
#[instrument(skip_all)]
pub async fn unique_lrn_indices(
    conn: &mut SqliteConnection,
) -> Result<Vec<IndexInfo>, AppError> {
    let rows = sqlx::query("PRAGMA index_list('students')")
        .fetch_all(&mut *conn)
        .await?;

    let mut found = Vec::new();
    for row in rows {
        let unique: i64 = row.try_get("unique")?;
        if unique == 0 {
            continue;
        }
        let name: String = row.try_get("name")?;
        let origin: String = row.try_get("origin")?;

        let columns: Vec<String> = sqlx::query(&format!("PRAGMA index_info('{}')", name))
            .fetch_all(&mut *conn)
            .await?
            .iter()
            .map(|column| column.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()?;

        if columns.len() == 1 && columns[0] == "lrn" {
            found.push(IndexInfo { name, origin });
        }
    }

    Ok(found)
}

/// Drops any uniqueness constraint on `students.lrn`. Returns whether the
/// schema changed.
#[instrument(skip(pool))]
pub async fn drop_unique_lrn_constraint(pool: &Pool<Sqlite>) -> Result<bool, AppError> {
    let mut conn = pool.acquire().await?;

    let indices = unique_lrn_indices(&mut conn).await?;
    if indices.is_empty() {
        return Ok(false);
    }

    warn!(indices = ?indices, "students.lrn carries a uniqueness constraint");

    if indices.iter().all(|index| index.origin == "c") {
        let mut tx = Connection::begin(&mut *conn).await?;
        for index in &indices {
            info!("Dropping unique index {}", index.name);
            sqlx::query(&format!("DROP INDEX \"{}\"", index.name))
                .execute(&mut *tx)
                .await?;
        }
        for sql in STUDENTS_INDICES {
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        return Ok(true);
    }

    // A table-level UNIQUE constraint can only go by rebuilding the table,
    // which has to happen with foreign key enforcement off.
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await?;
    let rebuilt = rebuild_students_table(&mut conn).await;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;
    rebuilt?;

    Ok(true)
}

async fn table_columns(
    conn: &mut SqliteConnection,
    table_name: &str,
) -> Result<HashSet<String>, AppError> {
    let rows = sqlx::query(&format!("PRAGMA table_info('{}')", table_name))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(AppError::from))
        .collect()
}

#[instrument(skip_all)]
async fn rebuild_students_table(conn: &mut SqliteConnection) -> Result<(), AppError> {
    info!("Rebuilding students table without the unique lrn constraint");
    let mut tx = Connection::begin(&mut *conn).await?;

    sqlx::query(STUDENTS_TABLE).execute(&mut *tx).await?;

    let current = table_columns(&mut tx, "students").await?;
    let target = table_columns(&mut tx, "students_migration_new").await?;
    let mut common: Vec<&String> = current.intersection(&target).collect();
    common.sort();

    let columns = common
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    sqlx::query(&format!(
        "INSERT INTO students_migration_new ({columns}) SELECT {columns} FROM students"
    ))
    .execute(&mut *tx)
    .await?;

    sqlx::query("DROP TABLE students").execute(&mut *tx).await?;
    sqlx::query("ALTER TABLE students_migration_new RENAME TO students")
        .execute(&mut *tx)
        .await?;
    for sql in STUDENTS_INDICES {
        sqlx::query(sql).execute(&mut *tx).await?;
    }

    let violations = sqlx::query("PRAGMA foreign_key_check")
        .fetch_all(&mut *tx)
        .await?;
    if !violations.is_empty() {
        tx.rollback().await?;
        return Err(AppError::Internal(format!(
            "Rebuilding students left {} foreign key violations",
            violations.len()
        )));
    }

    tx.commit().await?;
    Ok(())
}
