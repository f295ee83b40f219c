mod config;

pub use config::FrappeConfig;

use std::sync::Arc;

use async_trait::async_trait;
use portal_domain::{
    CoreError, Customer, Invoice, OptionRow, Subscription, SubscriptionPlan, SupportTicket,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::interface::{
    BillingBackend, BusinessOutcome, ConfirmPaymentRequest, CreateSubscriptionRequest,
    CreateTicketRequest, RegisterPaymentMethodRequest, SetPasswordRequest,
};
use crate::transport::{ReqwestRpcTransport, RpcRequest, RpcTransport};

const METHOD_CUSTOMER_BY_EMAIL: &str = "isp_billing.api.test.get_customer_by_email";
const METHOD_CUSTOMER_NAME_BY_EMAIL: &str = "isp_billing.api.customer.get_customer_name_by_email";
const METHOD_CUSTOMER_DIRECTORY: &str = "isp_billing.api.subscription.get_customer";
const METHOD_SUBSCRIPTION_DETAILS: &str = "isp_billing.api.subscription.get_subscription_details";
const METHOD_SUBSCRIPTION_PLANS: &str = "isp_billing.api.subscription.get_subscription_plans";
const METHOD_CREATE_SUBSCRIPTION: &str =
    "isp_billing.api.subscription.create_subscription_from_plan_api";
const METHOD_SALES_INVOICES: &str = "isp_billing.api.sales_invoice.get_sales_invoice";
const METHOD_ISSUES: &str = "isp_billing.api.issue.get_issues";
const METHOD_ISSUE_TYPES: &str = "isp_billing.api.issue.get_issue_type";
const METHOD_ISSUE_PRIORITIES: &str = "isp_billing.api.issue.get_issue_priority";
const METHOD_CREATE_ISSUE: &str = "isp_billing.api.issue.create_issue";
const METHOD_SET_USER_PASSWORD: &str = "isp_billing.api.customer.set_user_password";
const METHOD_REGISTER_PAYMENT_METHOD: &str =
    "isp_billing.api.payment.create_customer_and_payment_method";
const METHOD_CONFIRM_PAYMENT: &str = "isp_billing.api.payment_setup.payment_success";

/// Billing backend provider speaking the Frappe remote-procedure dialect:
/// `/api/method/<name>`, GET params in the query string, POST params as a
/// JSON body, success payloads wrapped in `{ "message": ... }`.
#[derive(Clone)]
pub struct FrappeBillingBackend {
    config: FrappeConfig,
    transport: Arc<dyn RpcTransport>,
}

impl FrappeBillingBackend {
    pub fn new(config: FrappeConfig) -> Result<Self, CoreError> {
        let transport =
            ReqwestRpcTransport::with_timeout(config.base_url.clone(), config.request_timeout)?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Injects a transport; used by tests and by callers that share one
    /// cookie-holding transport between billing and auth.
    pub fn with_transport(config: FrappeConfig, transport: Arc<dyn RpcTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &FrappeConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn RpcTransport> {
        Arc::clone(&self.transport)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<T>, CoreError> {
        let payload = self
            .transport
            .execute(RpcRequest::get(method, params))
            .await?;
        let rows = decode_message_list(payload, method)?;
        tracing::debug!(method, rows = rows.len(), "billing API collection fetched");
        Ok(rows)
    }

    async fn post_for_outcome(
        &self,
        method: &str,
        body: Value,
    ) -> Result<BusinessOutcome, CoreError> {
        let payload = self.transport.execute(RpcRequest::post(method, body)).await?;
        let outcome = parse_business_outcome(&payload);
        tracing::debug!(method, success = outcome.success, "billing API write completed");
        Ok(outcome)
    }
}

fn email_param(email: &str) -> Result<Vec<(String, String)>, CoreError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::Configuration(
            "identity email cannot be empty for a customer-scoped fetch.".to_owned(),
        ));
    }
    Ok(vec![("email".to_owned(), email.to_owned())])
}

/// Decodes the `message` collection out of an RPC envelope. A missing or
/// non-list `message` is an empty collection (the backend answers some empty
/// lists with a plain string); a row that fails schema validation is an
/// error, not a silently dropped record.
fn decode_message_list<T: DeserializeOwned>(
    payload: Value,
    method: &str,
) -> Result<Vec<T>, CoreError> {
    let Some(rows) = payload.get("message").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    rows.iter()
        .map(|row| {
            serde_json::from_value(row.clone()).map_err(|error| {
                CoreError::DependencyUnavailable(format!(
                    "billing API payload for `{method}` failed schema validation: {error}"
                ))
            })
        })
        .collect()
}

/// Reads a write outcome from the payload `success` flag, never from the
/// HTTP status: the backend reports business failures inside HTTP 200.
fn parse_business_outcome(payload: &Value) -> BusinessOutcome {
    match payload.get("message") {
        Some(Value::Object(message)) => BusinessOutcome {
            success: flag_is_set(message.get("success")),
            detail: string_field(message.get("msg")).or_else(|| string_field(message.get("message"))),
            reference: string_field(message.get("issue_name"))
                .or_else(|| string_field(message.get("subscription")))
                .or_else(|| string_field(message.get("subscription_enhancement"))),
        },
        Some(Value::String(text)) => BusinessOutcome {
            success: true,
            detail: Some(text.clone()),
            reference: None,
        },
        _ => BusinessOutcome {
            success: false,
            detail: Some("backend response did not include an outcome payload".to_owned()),
            reference: None,
        },
    }
}

fn flag_is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::trim).and_then(|text| {
        if text.is_empty() {
            None
        } else {
            Some(text.to_owned())
        }
    })
}

fn require_field(value: &str, field: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Configuration(format!(
            "{field} cannot be empty."
        )));
    }
    Ok(value.to_owned())
}

#[async_trait]
impl BillingBackend for FrappeBillingBackend {
    async fn customer_profile(&self, email: &str) -> Result<Option<Customer>, CoreError> {
        let rows: Vec<Customer> = self
            .fetch_list(METHOD_CUSTOMER_BY_EMAIL, email_param(email)?)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn customer_name(&self, email: &str) -> Result<Option<String>, CoreError> {
        let payload = self
            .transport
            .execute(RpcRequest::get(
                METHOD_CUSTOMER_NAME_BY_EMAIL,
                email_param(email)?,
            ))
            .await?;
        Ok(string_field(payload.get("message")))
    }

    async fn customer_directory(&self) -> Result<Vec<Customer>, CoreError> {
        self.fetch_list(METHOD_CUSTOMER_DIRECTORY, Vec::new()).await
    }

    async fn subscriptions(&self, email: &str) -> Result<Vec<Subscription>, CoreError> {
        self.fetch_list(METHOD_SUBSCRIPTION_DETAILS, email_param(email)?)
            .await
    }

    async fn subscription_plans(&self) -> Result<Vec<SubscriptionPlan>, CoreError> {
        self.fetch_list(METHOD_SUBSCRIPTION_PLANS, Vec::new()).await
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        let customer = require_field(&request.customer, "subscription customer")?;
        if request.plan_details.is_empty() {
            return Err(CoreError::Configuration(
                "subscription request must include at least one plan.".to_owned(),
            ));
        }
        for detail in &request.plan_details {
            require_field(&detail.plan, "subscription plan name")?;
            if detail.qty <= 0.0 {
                return Err(CoreError::Configuration(
                    "subscription plan qty must be greater than zero.".to_owned(),
                ));
            }
        }

        self.post_for_outcome(
            METHOD_CREATE_SUBSCRIPTION,
            json!({
                "customer": customer,
                "plan_details": request.plan_details,
            }),
        )
        .await
    }

    async fn invoices(&self, email: &str) -> Result<Vec<Invoice>, CoreError> {
        self.fetch_list(METHOD_SALES_INVOICES, email_param(email)?)
            .await
    }

    async fn support_tickets(&self, email: &str) -> Result<Vec<SupportTicket>, CoreError> {
        self.fetch_list(METHOD_ISSUES, email_param(email)?).await
    }

    async fn issue_types(&self) -> Result<Vec<OptionRow>, CoreError> {
        self.fetch_list(METHOD_ISSUE_TYPES, Vec::new()).await
    }

    async fn issue_priorities(&self) -> Result<Vec<OptionRow>, CoreError> {
        self.fetch_list(METHOD_ISSUE_PRIORITIES, Vec::new()).await
    }

    async fn create_ticket(
        &self,
        request: CreateTicketRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        let subject = require_field(&request.subject, "ticket subject")?;
        let description = require_field(&request.description, "ticket description")?;
        let customer = require_field(&request.customer, "ticket customer")?;
        let issue_type = require_field(&request.issue_type, "ticket issue type")?;
        let email = require_field(&request.email, "ticket reporter email")?;

        self.post_for_outcome(
            METHOD_CREATE_ISSUE,
            json!({
                "subject": subject,
                "description": description,
                "email": email,
                "customer": customer,
                "issue_type": issue_type,
                "priority": request.priority,
                "group": request.group,
                "select_type": request.select_type,
            }),
        )
        .await
    }

    async fn set_user_password(
        &self,
        request: SetPasswordRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        let email = require_field(&request.email, "account email")?;
        let new_password = require_field(&request.new_password, "new password")?;

        self.post_for_outcome(
            METHOD_SET_USER_PASSWORD,
            json!({
                "email": email,
                "new_password": new_password,
            }),
        )
        .await
    }

    async fn register_payment_method(
        &self,
        request: RegisterPaymentMethodRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        let email = require_field(&request.email, "cardholder email")?;
        let name = require_field(&request.name, "cardholder name")?;
        let payment_method_id = require_field(&request.payment_method_id, "payment method id")?;

        self.post_for_outcome(
            METHOD_REGISTER_PAYMENT_METHOD,
            json!({
                "email": email,
                "name": name,
                "payment_method_id": payment_method_id,
            }),
        )
        .await
    }

    async fn confirm_payment(
        &self,
        request: ConfirmPaymentRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        let enhancement_id = require_field(&request.enhancement_id, "enhancement id")?;

        self.post_for_outcome(
            METHOD_CONFIRM_PAYMENT,
            json!({ "enhancement_id": enhancement_id }),
        )
        .await
    }
}
