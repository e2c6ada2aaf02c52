use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role label carried by every supervisor account.
pub const SUPERVISOR_ROLE: &str = "MNREGA Supervisor";

/// The authenticated operator of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "username": "test1",
        "name": "Test Admin 1",
        "role": "MNREGA Supervisor"
    })
)]
pub struct Supervisor {
    pub username: String,
    pub name: String,
    pub role: String,
}
