pub mod forms;
pub mod screens;
pub mod view_model;

pub use forms::{FormPhase, PasswordForm, SubscribeForm, TicketForm};
pub use screens::{
    AccountScreen, AdminDirectory, CustomerActivity, CustomerDashboard, InvoiceScreen,
    SubscriptionScreen, TicketDesk,
};
pub use view_model::{EntityViewModel, FetchTicket, LoadOutcome};
