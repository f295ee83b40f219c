pub mod error;
pub mod filter;
pub mod records;

pub use error::CoreError;
pub use filter::{filter_records, FilterQuery, Filterable};
pub use records::{
    Customer, Identity, Invoice, OptionRow, PlanDetail, Subscription, SubscriptionPlan,
    SupportTicket,
};
