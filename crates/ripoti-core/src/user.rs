//! Users and their login sessions.
//!
//! A user is created once at registration and never edited. The username is
//! derived from the name fields by the store (see [`crate::username`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered member of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "id")]
  pub user_id:  i64,
  /// Given name.
  pub jina:     String,
  /// Clan or family name.
  pub ukoo:     String,
  /// Phone number, free text.
  pub namba:    String,
  /// Clinic or station the user reports from.
  pub kituo:    String,
  /// Lowercase, unique; derived from `jina` + `ukoo`.
  pub username: String,
}

/// Input to [`crate::store::BoardStore::create_user`].
/// The username is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub jina:          String,
  pub ukoo:          String,
  pub namba:         String,
  pub kituo:         String,
  /// PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// A user together with the stored password hash; only used for login.
#[derive(Debug, Clone)]
pub struct LoginRecord {
  pub user:          User,
  pub password_hash: String,
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::BoardStore::create_session`].
///
/// The session id is generated by the caller; the store treats it as opaque.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub session_id: String,
  pub user_id:    i64,
  pub expires_at: DateTime<Utc>,
}
