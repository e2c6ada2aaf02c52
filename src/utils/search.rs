use crate::model::{Team, Worker};

#[inline]
fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains_any(needle: &str, fields: [&str; 2]) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(needle))
}

/// Case-insensitive substring match on team name or id. Blank returns all.
pub fn filter_teams<'a>(teams: &'a [Team], query: &str) -> Vec<&'a Team> {
    let needle = normalize(query);
    teams
        .iter()
        .filter(|t| needle.is_empty() || contains_any(&needle, [t.name.as_str(), t.id.as_str()]))
        .collect()
}

/// Case-insensitive substring match on worker name or id. Blank returns all.
pub fn filter_workers<'a>(team: &'a Team, query: &str) -> Vec<&'a Worker> {
    let needle = normalize(query);
    team.workers
        .iter()
        .filter(|w| needle.is_empty() || contains_any(&needle, [w.name.as_str(), w.id.as_str()]))
        .collect()
}
