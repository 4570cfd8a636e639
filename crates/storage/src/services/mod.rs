pub mod competitions;
pub mod credits;
pub mod ledger;
pub mod pricing;
pub mod registration;
pub mod settlement;
pub mod users;
