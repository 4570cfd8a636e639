pub mod competition;
pub mod credit;
pub mod payment;
pub mod registration;
pub mod result;
pub mod user;
