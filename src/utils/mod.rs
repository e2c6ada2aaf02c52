pub mod attendance_ledger;
pub mod ids;
pub mod search;
