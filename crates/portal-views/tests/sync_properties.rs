use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use portal_backend::{
    BillingBackend, BusinessOutcome, ConfirmPaymentRequest, CreateSubscriptionRequest,
    CreateTicketRequest, RegisterPaymentMethodRequest, SetPasswordRequest,
};
use portal_domain::{
    CoreError, Customer, Identity, Invoice, OptionRow, Subscription, SubscriptionPlan,
    SupportTicket,
};
use portal_views::{FormPhase, InvoiceScreen, SubscriptionScreen, TicketDesk};

#[derive(Default)]
struct StubBackend {
    calls: Mutex<Vec<String>>,
    invoice_responses: Mutex<VecDeque<Result<Vec<Invoice>, CoreError>>>,
    ticket_responses: Mutex<VecDeque<Result<Vec<SupportTicket>, CoreError>>>,
    subscription_responses: Mutex<VecDeque<Result<Vec<Subscription>, CoreError>>>,
    outcome_responses: Mutex<VecDeque<Result<BusinessOutcome, CoreError>>>,
}

impl StubBackend {
    fn record(&self, call: &str) {
        self.calls.lock().expect("call log").push(call.to_owned());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log").clone()
    }

    fn queue_invoices(&self, response: Result<Vec<Invoice>, CoreError>) {
        self.invoice_responses
            .lock()
            .expect("invoice queue")
            .push_back(response);
    }

    fn queue_tickets(&self, response: Result<Vec<SupportTicket>, CoreError>) {
        self.ticket_responses
            .lock()
            .expect("ticket queue")
            .push_back(response);
    }

    fn queue_subscriptions(&self, response: Result<Vec<Subscription>, CoreError>) {
        self.subscription_responses
            .lock()
            .expect("subscription queue")
            .push_back(response);
    }

    fn queue_outcome(&self, response: Result<BusinessOutcome, CoreError>) {
        self.outcome_responses
            .lock()
            .expect("outcome queue")
            .push_back(response);
    }

    fn next_outcome(&self) -> Result<BusinessOutcome, CoreError> {
        self.outcome_responses
            .lock()
            .expect("outcome queue")
            .pop_front()
            .unwrap_or_else(|| Ok(BusinessOutcome::default()))
    }
}

#[async_trait]
impl BillingBackend for StubBackend {
    async fn customer_profile(&self, _email: &str) -> Result<Option<Customer>, CoreError> {
        self.record("customer_profile");
        Ok(None)
    }

    async fn customer_name(&self, _email: &str) -> Result<Option<String>, CoreError> {
        self.record("customer_name");
        Ok(None)
    }

    async fn customer_directory(&self) -> Result<Vec<Customer>, CoreError> {
        self.record("customer_directory");
        Ok(Vec::new())
    }

    async fn subscriptions(&self, _email: &str) -> Result<Vec<Subscription>, CoreError> {
        self.record("subscriptions");
        self.subscription_responses
            .lock()
            .expect("subscription queue")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn subscription_plans(&self) -> Result<Vec<SubscriptionPlan>, CoreError> {
        self.record("subscription_plans");
        Ok(Vec::new())
    }

    async fn create_subscription(
        &self,
        _request: CreateSubscriptionRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        self.record("create_subscription");
        self.next_outcome()
    }

    async fn invoices(&self, _email: &str) -> Result<Vec<Invoice>, CoreError> {
        self.record("invoices");
        self.invoice_responses
            .lock()
            .expect("invoice queue")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn support_tickets(&self, _email: &str) -> Result<Vec<SupportTicket>, CoreError> {
        self.record("support_tickets");
        self.ticket_responses
            .lock()
            .expect("ticket queue")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn issue_types(&self) -> Result<Vec<OptionRow>, CoreError> {
        self.record("issue_types");
        Ok(vec![OptionRow {
            name: "Incident".to_owned(),
        }])
    }

    async fn issue_priorities(&self) -> Result<Vec<OptionRow>, CoreError> {
        self.record("issue_priorities");
        Ok(vec![OptionRow {
            name: "Medium".to_owned(),
        }])
    }

    async fn create_ticket(
        &self,
        _request: CreateTicketRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        self.record("create_ticket");
        self.next_outcome()
    }

    async fn set_user_password(
        &self,
        _request: SetPasswordRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        self.record("set_user_password");
        self.next_outcome()
    }

    async fn register_payment_method(
        &self,
        _request: RegisterPaymentMethodRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        self.record("register_payment_method");
        self.next_outcome()
    }

    async fn confirm_payment(
        &self,
        _request: ConfirmPaymentRequest,
    ) -> Result<BusinessOutcome, CoreError> {
        self.record("confirm_payment");
        self.next_outcome()
    }
}

fn invoice(name: &str) -> Invoice {
    Invoice {
        name: name.to_owned(),
        customer: "Acme".to_owned(),
        posting_date: "2024-01-01".to_owned(),
        grand_total: 10.0,
        currency: "USD".to_owned(),
        status: "Paid".to_owned(),
    }
}

fn ticket(name: &str) -> SupportTicket {
    SupportTicket {
        name: name.to_owned(),
        customer: "Acme".to_owned(),
        subject: "Line down".to_owned(),
        description: "No sync since Friday".to_owned(),
        status: "Open".to_owned(),
        priority: "Medium".to_owned(),
        custom_group: None,
        custom_type: None,
        custom_assigned_to: None,
        custom_watchers: None,
    }
}

fn subscription(name: &str, plan: &str) -> Subscription {
    Subscription {
        name: name.to_owned(),
        party_type: "Customer".to_owned(),
        party: "Acme".to_owned(),
        status: "Active".to_owned(),
        plans: vec![portal_domain::PlanDetail {
            plan: plan.to_owned(),
            qty: 1.0,
            cost: 49.0,
        }],
    }
}

fn accepted(reference: &str) -> Result<BusinessOutcome, CoreError> {
    Ok(BusinessOutcome {
        success: true,
        detail: None,
        reference: Some(reference.to_owned()),
    })
}

fn refused(msg: &str) -> Result<BusinessOutcome, CoreError> {
    Ok(BusinessOutcome {
        success: false,
        detail: Some(msg.to_owned()),
        reference: None,
    })
}

#[tokio::test]
async fn missing_identity_short_circuits_without_touching_the_backend() {
    let backend = StubBackend::default();
    let mut screen = InvoiceScreen::new();

    screen.load(&backend, None).await;

    assert!(backend.calls().is_empty());
    assert!(screen.invoices.data().is_empty());
    assert!(!screen.invoices.is_loading());
}

#[tokio::test]
async fn switching_identities_never_leaves_the_previous_rows_visible() {
    let backend = StubBackend::default();
    backend.queue_invoices(Ok(vec![invoice("INV-A-1")]));
    backend.queue_invoices(Err(CoreError::DependencyUnavailable("offline".to_owned())));

    let mut screen = InvoiceScreen::new();
    screen.load(&backend, Some(&Identity::from("a@x.com"))).await;
    assert_eq!(screen.invoices.data().len(), 1);

    // B's fetch fails, but A's rows must already be gone.
    screen.load(&backend, Some(&Identity::from("b@x.com"))).await;
    assert!(screen.invoices.data().is_empty());
    assert!(screen.invoices.error().is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_the_last_snapshot_for_the_same_identity() {
    let backend = StubBackend::default();
    backend.queue_invoices(Ok(vec![invoice("INV-A-1")]));
    backend.queue_invoices(Err(CoreError::DependencyUnavailable("offline".to_owned())));

    let identity = Identity::from("a@x.com");
    let mut screen = InvoiceScreen::new();
    screen.load(&backend, Some(&identity)).await;
    screen.load(&backend, Some(&identity)).await;

    assert_eq!(screen.invoices.data().len(), 1, "stale rows stay visible");
    assert!(screen.invoices.error().is_some());
}

#[tokio::test]
async fn invalid_ticket_draft_causes_zero_network_activity() {
    let backend = StubBackend::default();
    let mut desk = TicketDesk::new();
    desk.form.open();
    desk.form.description = "No sync since Friday".to_owned();
    desk.form.issue_type = "Incident".to_owned();
    // subject left blank

    let accepted = desk.submit(&backend, &Identity::from("a@x.com"), "Acme").await;

    assert!(!accepted);
    assert!(backend.calls().is_empty());
    assert_eq!(desk.form.phase(), FormPhase::Open);
    assert!(desk.form.error().is_some());
}

#[tokio::test]
async fn accepted_ticket_is_followed_by_a_fresh_server_read() {
    let backend = StubBackend::default();
    backend.queue_outcome(accepted("ISS-2024-00042"));
    backend.queue_tickets(Ok(vec![ticket("ISS-2024-00042")]));

    let mut desk = TicketDesk::new();
    desk.form.open();
    desk.form.subject = "Line down".to_owned();
    desk.form.description = "No sync since Friday".to_owned();
    desk.form.issue_type = "Incident".to_owned();

    let submitted = desk.submit(&backend, &Identity::from("a@x.com"), "Acme").await;

    assert!(submitted);
    assert_eq!(desk.form.phase(), FormPhase::Closed);
    assert_eq!(
        backend.calls(),
        vec!["create_ticket".to_owned(), "support_tickets".to_owned()],
        "the visible row must come from the server, not a local insert"
    );
    assert_eq!(desk.tickets.data()[0].name, "ISS-2024-00042");
}

#[tokio::test]
async fn refused_ticket_reopens_the_form_and_skips_the_refresh() {
    let backend = StubBackend::default();
    backend.queue_outcome(refused("Customer not found."));

    let mut desk = TicketDesk::new();
    desk.form.open();
    desk.form.subject = "Line down".to_owned();
    desk.form.description = "No sync since Friday".to_owned();
    desk.form.issue_type = "Incident".to_owned();

    let submitted = desk.submit(&backend, &Identity::from("a@x.com"), "Acme").await;

    assert!(!submitted);
    assert_eq!(desk.form.phase(), FormPhase::Open);
    assert_eq!(desk.form.error(), Some("Customer not found."));
    assert_eq!(backend.calls(), vec!["create_ticket".to_owned()]);
}

#[tokio::test]
async fn subscribe_success_rereads_subscriptions_from_the_server() {
    let backend = StubBackend::default();
    backend.queue_subscriptions(Ok(Vec::new()));
    backend.queue_outcome(accepted("ACC-SUB-2025-00009"));
    backend.queue_subscriptions(Ok(vec![subscription("ACC-SUB-2025-00009", "Fiber 200")]));

    let identity = Identity::from("a@x.com");
    let mut screen = SubscriptionScreen::new();
    screen.load(&backend, Some(&identity)).await;
    assert!(!screen.is_current_plan("Fiber 200"));

    screen.form.open("Fiber 200", 49.0);
    let subscribed = screen.subscribe(&backend, &identity, "Acme").await;

    assert!(subscribed);
    assert!(screen.is_current_plan("Fiber 200"));
    let calls = backend.calls();
    assert_eq!(calls.last(), Some(&"subscriptions".to_owned()));
}

#[tokio::test]
async fn payment_confirmation_verdict_comes_from_the_payload() {
    let backend = StubBackend::default();
    backend.queue_outcome(refused("Payment is already Paid."));

    let mut screen = SubscriptionScreen::new();
    screen
        .confirm_payment(&backend, "SE-2024-0007")
        .await
        .expect("confirmation call resolves");

    let notice = screen.payment_notice.as_ref().expect("notice recorded");
    assert!(!notice.success);
    assert_eq!(notice.detail.as_deref(), Some("Payment is already Paid."));
}
