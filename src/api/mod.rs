pub mod attendance;
pub mod teams;
pub mod verify;
