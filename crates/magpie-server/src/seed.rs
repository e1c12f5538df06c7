use tracing::info;

use magpie_api::auth::hash_password;
use magpie_db::Database;

/// Create the demo accounts used for local development and manual
/// testing. Idempotent: an already-seeded database is left alone.
pub fn demo_users(db: &Database) -> anyhow::Result<()> {
    if db.get_user_by_name("John")?.is_some() {
        return Ok(());
    }

    let john = db.create_user("John", &hash_password("password")?, true)?;
    db.create_api_key(john, "test")?;

    let mike = db.create_user("Mike", &hash_password("password")?, true)?;
    db.create_api_key(mike, "test2")?;

    info!("Seeded demo users John (api-key 'test') and Mike (api-key 'test2')");
    Ok(())
}
