//! Demonstration data.

use sqlx::PgPool;

use snippetbox_web::db::{PgSnippetStore, SnippetStore};

use super::CliError;

/// `(title, content, days until expiry)`
const DEMO_SNIPPETS: [(&str, &str, u32); 3] = [
    (
        "An old silent pond",
        "An old silent pond...\nA frog jumps into the pond,\nsplash! Silence again.\n\n– Matsuo Bashō",
        365,
    ),
    (
        "Over the wintry forest",
        "Over the wintry\nforest, winds howl in rage\nwith no leaves to blow.\n\n– Natsume Soseki",
        365,
    ),
    (
        "First autumn morning",
        "First autumn morning\nthe mirror I stare into\nshows my father's face.\n\n– Murakami Kijo",
        7,
    ),
];

/// Insert the demonstration snippets.
///
/// # Errors
///
/// Returns `CliError::Repository` if an insert fails.
pub async fn run(pool: PgPool) -> Result<(), CliError> {
    let snippets = PgSnippetStore::new(pool);

    for (title, content, days) in DEMO_SNIPPETS {
        let id = snippets.insert(title, content, days).await?;
        tracing::info!(snippet_id = %id, title, "Seeded snippet");
    }

    tracing::info!(count = DEMO_SNIPPETS.len(), "Seeding complete!");
    Ok(())
}
