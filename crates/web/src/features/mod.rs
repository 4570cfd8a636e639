pub mod competitions;
pub mod credits;
pub mod payments;
pub mod registrations;
pub mod users;
