pub mod interface;
pub mod providers;
pub mod transport;

pub use interface::{
    BillingBackend, BusinessOutcome, ConfirmPaymentRequest, CreateSubscriptionRequest,
    CreateTicketRequest, RegisterPaymentMethodRequest, SetPasswordRequest,
};
pub use providers::frappe::{FrappeBillingBackend, FrappeConfig};
pub use transport::{ReqwestRpcTransport, RpcCall, RpcRequest, RpcTransport};
