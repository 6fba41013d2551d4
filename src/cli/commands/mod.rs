//! CLI command implementations

pub mod cal;
pub mod cert;
pub mod gauge;
pub mod init;
pub mod set;
pub mod spares;
pub mod status;
pub mod team;
pub mod verify;
