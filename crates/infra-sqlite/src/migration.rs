// Schema migrations

use sqlx::SqlitePool;
use tracing::info;

/// Ordered schema migrations: (version, name, script)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "initial schema",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Bring the schema up to the newest version
///
/// Each pending script runs in its own transaction together with the
/// `schema_version` row that records it, so a failed script leaves no trace.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let current = current_version(pool).await?;
    info!(version = current, "Checking schema version");

    for &(version, name, script) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        info!(version, name, "Applying migration");

        let mut tx = pool.begin().await?;
        for statement in split_statements(script) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, strftime('%s', 'now'))")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Split a script into statements on `;`, dropping `--` and `/* */` comments.
///
/// Semicolons inside comments, quoted strings or quoted identifiers do not
/// end a statement. Empty statements are skipped.
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                current.push(' ');
            }
            '\'' | '"' => {
                // A doubled quote inside the literal closes and reopens it,
                // which leaves the text intact.
                current.push(c);
                for quoted in chars.by_ref() {
                    current.push(quoted);
                    if quoted == c {
                        break;
                    }
                }
            }
            ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}
