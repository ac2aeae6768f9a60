pub mod authorization;
pub mod role;
