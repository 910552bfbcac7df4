use serde::Serialize;

use crate::domain::auth::{Feature, Role};
use crate::domain::types::UserId;

/// Who is signed in and which navigation entries to show.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub features: &'static [Feature],
}
