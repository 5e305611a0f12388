//! Password acquisition. Secrets never touch the session registry.

use anyhow::{Context, Result};
use srvcmd_core::Session;

/// Environment variable consulted before prompting.
pub const PASSWORD_ENV: &str = "SERVERCOMMANDER_PASSWORD";

/// Password for `session`: `$SERVERCOMMANDER_PASSWORD` when set, an
/// interactive no-echo prompt when the session requires one, otherwise empty.
pub fn password_for(session: &Session) -> Result<String> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }
    if !session.requires_pass {
        return Ok(String::new());
    }
    let prompt = format!("Password for {}@{}: ", session.username, session.host);
    rpassword::prompt_password(prompt).context("failed to read password")
}

fn password_from_env() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok()
}
