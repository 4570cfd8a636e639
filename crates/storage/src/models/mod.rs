mod competition;
mod competition_result;
mod credit_balance;
mod credit_transaction;
mod payment_event;
mod registration;
mod user;

pub use competition::{Competition, CompetitionStatus};
pub use competition_result::CompetitionResult;
pub use credit_balance::CreditBalance;
pub use credit_transaction::{CreditTransaction, CreditType, TransactionType};
pub use payment_event::PaymentProvider;
pub use registration::{CompetitionRegistration, PaymentMethod, RegistrationStatus};
pub use user::{User, UserRole};
