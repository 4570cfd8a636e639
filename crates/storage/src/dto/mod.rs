pub mod common;
pub mod competition;
pub mod credits;
pub mod payment;
pub mod registration;
pub mod user;
