use morrow_core::{Database, Profile};
use uuid::Uuid;

/// The single local profile this CLI operates on. A fixed id keeps the
/// database self-contained without an account system.
const LOCAL_USER: Uuid = Uuid::nil();

/// Load the local profile, creating it on first use.
pub fn load_or_create_profile(db: &Database) -> Result<Profile, Box<dyn std::error::Error>> {
    if let Some(profile) = db.profile(LOCAL_USER)? {
        return Ok(profile);
    }
    let profile = Profile::new(LOCAL_USER);
    db.upsert_profile(&profile)?;
    Ok(profile)
}
