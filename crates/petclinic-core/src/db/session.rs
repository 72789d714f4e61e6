//! Logged-in profile persistence.

use tracing::{debug, info, warn};

use super::{Database, DbResult};
use crate::models::Person;

const USER_KEY: &str = "user";

/// Stores the profile returned by a successful login.
pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn save_user(&self, user: &Person) -> DbResult<()> {
        let json = serde_json::to_string(user)?;
        self.db.set_state(USER_KEY, &json)?;
        info!(user_id = %user.id, "session saved");
        Ok(())
    }

    /// The stored profile, if any. A corrupt entry is treated as logged out.
    pub fn current_user(&self) -> DbResult<Option<Person>> {
        let Some(raw) = self.db.get_state(USER_KEY)? else {
            debug!("no stored session");
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable stored session");
                Ok(None)
            }
        }
    }

    pub fn clear_user(&self) -> DbResult<()> {
        self.db.remove_state(USER_KEY)?;
        info!("session cleared");
        Ok(())
    }
}
