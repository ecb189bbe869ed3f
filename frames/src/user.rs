//! Session user shapes returned by the auth endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::WireTimestamp;
use crate::{WireError, id_string, non_empty};

/// The signed-in (or anonymous) user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_anonymous: bool,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A user plus the bearer token issued alongside it, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_anonymous: Option<bool>,
    #[serde(default)]
    created_at: Option<WireTimestamp>,
}

/// Normalize a wire user object.
///
/// A missing `name` falls back to the local part of the email address.
///
/// # Errors
///
/// Returns [`WireError::MissingField`] when `id` is absent.
pub fn parse_user(value: &Value, received_at_ms: i64) -> Result<User, WireError> {
    let wire: WireUser = serde_json::from_value(value.clone())?;
    let id = wire.id.as_ref().and_then(id_string).ok_or(WireError::MissingField("id"))?;
    let email = non_empty(wire.email).unwrap_or_default();
    let name = non_empty(wire.name)
        .or_else(|| email.split('@').next().filter(|s| !s.is_empty()).map(str::to_owned))
        .unwrap_or_else(|| "Anonyme".to_owned());
    let created_at = match wire.created_at {
        Some(ts) => ts.into_millis()?,
        None => received_at_ms,
    };
    Ok(User {
        id,
        email,
        name,
        is_anonymous: wire.is_anonymous.unwrap_or(false),
        created_at,
    })
}

/// Normalize a login/register/me response.
///
/// Accepts `{ user, token }`, `{ user }` and a bare user object.
///
/// # Errors
///
/// Propagates [`parse_user`] failures.
pub fn parse_auth_response(body: &Value, received_at_ms: i64) -> Result<AuthSession, WireError> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);
    let user_value = body.get("user").unwrap_or(body);
    let user = parse_user(user_value, received_at_ms)?;
    Ok(AuthSession { user, token })
}
