//! Session command handlers: login, logout, profile.

use fixly_api::Identity;
use fixly_session::{SessionError, SessionManager};

/// Restores the cached session, failing with a login hint when there is
/// none to restore.
///
/// # Errors
///
/// [`SessionError::LoggedOut`] when no session is cached or the cached
/// token went stale; any other [`SessionError`] from the restore itself.
pub(crate) async fn require_session(session: &mut SessionManager) -> anyhow::Result<Identity> {
    match session.resume().await? {
        Some(me) => Ok(me),
        None => Err(SessionError::LoggedOut.into()),
    }
}

/// Log in and cache the session for later runs.
///
/// # Errors
///
/// Returns an error when the credentials are rejected or the token cannot
/// be cached.
pub(crate) async fn run_login(
    session: &mut SessionManager,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let me = session.login(email, password).await?;
    println!("Logged in as {} <{}>.", me.name, me.email);
    if session.channel().is_none() {
        println!("Realtime updates are unavailable; tracking falls back to polling.");
    }
    Ok(())
}

/// Log out, clearing the cached token. Works from any state; logging out
/// twice is harmless.
///
/// # Errors
///
/// Returns an error when the cached token file cannot be removed.
pub(crate) async fn run_logout(session: &mut SessionManager) -> anyhow::Result<()> {
    session.logout().await?;
    println!("Logged out.");
    Ok(())
}

/// Show the logged-in identity.
///
/// # Errors
///
/// Returns an error when no session can be restored.
pub(crate) async fn run_profile(session: &mut SessionManager) -> anyhow::Result<()> {
    let me = require_session(session).await?;
    println!("Name:   {}", me.name);
    println!("Email:  {}", me.email);
    println!("Id:     {}", me.id);
    Ok(())
}
