pub mod account;
pub mod privilege;
pub mod role;
