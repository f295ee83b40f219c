use async_trait::async_trait;
use portal_domain::{
    CoreError, Customer, Invoice, OptionRow, PlanDetail, Subscription, SubscriptionPlan,
    SupportTicket,
};
use serde::{Deserialize, Serialize};

/// Outcome of a write operation the backend reports inside an HTTP 200
/// payload. `success` comes from the payload flag, never the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessOutcome {
    pub success: bool,
    /// Human-readable message from the backend, when present.
    pub detail: Option<String>,
    /// Server-assigned document name (new ticket, subscription, enhancement).
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub email: String,
    pub customer: String,
    pub issue_type: String,
    pub priority: String,
    pub group: String,
    pub select_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub customer: String,
    pub plan_details: Vec<PlanDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPaymentMethodRequest {
    pub email: String,
    pub name: String,
    pub payment_method_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub enhancement_id: String,
}

/// Typed facade over the billing backend's remote-procedure API. All reads
/// are identity-scoped snapshots; all responses are untrusted and parsed at
/// this boundary.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    async fn customer_profile(&self, email: &str) -> Result<Option<Customer>, CoreError>;
    async fn customer_name(&self, email: &str) -> Result<Option<String>, CoreError>;
    /// Full directory, admin dashboard only.
    async fn customer_directory(&self) -> Result<Vec<Customer>, CoreError>;
    async fn subscriptions(&self, email: &str) -> Result<Vec<Subscription>, CoreError>;
    async fn subscription_plans(&self) -> Result<Vec<SubscriptionPlan>, CoreError>;
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<BusinessOutcome, CoreError>;
    async fn invoices(&self, email: &str) -> Result<Vec<Invoice>, CoreError>;
    async fn support_tickets(&self, email: &str) -> Result<Vec<SupportTicket>, CoreError>;
    async fn issue_types(&self) -> Result<Vec<OptionRow>, CoreError>;
    async fn issue_priorities(&self) -> Result<Vec<OptionRow>, CoreError>;
    async fn create_ticket(&self, request: CreateTicketRequest)
        -> Result<BusinessOutcome, CoreError>;
    async fn set_user_password(
        &self,
        request: SetPasswordRequest,
    ) -> Result<BusinessOutcome, CoreError>;
    async fn register_payment_method(
        &self,
        request: RegisterPaymentMethodRequest,
    ) -> Result<BusinessOutcome, CoreError>;
    async fn confirm_payment(
        &self,
        request: ConfirmPaymentRequest,
    ) -> Result<BusinessOutcome, CoreError>;
}
