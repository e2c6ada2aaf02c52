use uuid::Uuid;

use crate::model::TeamId;

/// Fresh, opaque team id.
pub fn new_team_id() -> TeamId {
    let raw = Uuid::new_v4().to_simple().to_string();
    TeamId::new(format!("team-{}", &raw[..8]))
}
