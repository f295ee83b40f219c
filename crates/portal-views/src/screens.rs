use portal_backend::{BillingBackend, BusinessOutcome, ConfirmPaymentRequest};
use portal_domain::{
    filter_records, CoreError, Customer, FilterQuery, Identity, Invoice, OptionRow, Subscription,
    SubscriptionPlan, SupportTicket,
};

use crate::forms::{PasswordForm, SubscribeForm, TicketForm};
use crate::view_model::EntityViewModel;

fn scoped_email(identity: Option<&Identity>) -> String {
    identity.map(|id| id.as_str().to_owned()).unwrap_or_default()
}

/// Landing screen for a signed-in customer: profile plus active
/// subscriptions, fetched concurrently.
#[derive(Debug, Default)]
pub struct CustomerDashboard {
    pub profile: EntityViewModel<Option<Customer>>,
    pub subscriptions: EntityViewModel<Vec<Subscription>>,
}

impl CustomerDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, backend: &dyn BillingBackend, identity: Option<&Identity>) {
        let profile_ticket = self.profile.begin_load(identity);
        let subscription_ticket = self.subscriptions.begin_load(identity);
        let email = scoped_email(identity);

        if let (Some(profile_ticket), Some(subscription_ticket)) =
            (profile_ticket, subscription_ticket)
        {
            let (profile, subscriptions) =
                tokio::join!(backend.customer_profile(&email), backend.subscriptions(&email));
            self.profile.complete(profile_ticket, profile);
            self.subscriptions.complete(subscription_ticket, subscriptions);
        }
    }

    /// Customer document name backing this account, used as the write key
    /// for tickets and subscriptions.
    pub fn customer_key(&self) -> Option<&str> {
        self.profile.data().as_ref().map(|customer| customer.name.as_str())
    }
}

/// Invoice history with client-side filtering.
#[derive(Debug, Default)]
pub struct InvoiceScreen {
    pub invoices: EntityViewModel<Vec<Invoice>>,
    pub query: FilterQuery,
}

impl InvoiceScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, backend: &dyn BillingBackend, identity: Option<&Identity>) {
        let Some(ticket) = self.invoices.begin_load(identity) else {
            return;
        };
        let result = backend.invoices(&scoped_email(identity)).await;
        self.invoices.complete(ticket, result);
    }

    /// The filtered rows to render. Filtering never mutates the snapshot.
    pub fn visible(&self) -> Vec<Invoice> {
        filter_records(self.invoices.data(), &self.query)
    }
}

/// Support desk: the customer's tickets, the dropdown catalogs, and the
/// new-ticket form.
#[derive(Debug, Default)]
pub struct TicketDesk {
    pub tickets: EntityViewModel<Vec<SupportTicket>>,
    pub issue_types: EntityViewModel<Vec<OptionRow>>,
    pub priorities: EntityViewModel<Vec<OptionRow>>,
    pub form: TicketForm,
    pub query: FilterQuery,
}

impl TicketDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, backend: &dyn BillingBackend, identity: Option<&Identity>) {
        let types_ticket = self.issue_types.begin_catalog_load();
        let priorities_ticket = self.priorities.begin_catalog_load();
        let (types, priorities) = tokio::join!(backend.issue_types(), backend.issue_priorities());
        self.issue_types.complete(types_ticket, types);
        self.priorities.complete(priorities_ticket, priorities);

        self.reload_tickets(backend, identity).await;
    }

    async fn reload_tickets(&mut self, backend: &dyn BillingBackend, identity: Option<&Identity>) {
        let Some(ticket) = self.tickets.begin_load(identity) else {
            return;
        };
        let result = backend.support_tickets(&scoped_email(identity)).await;
        self.tickets.complete(ticket, result);
    }

    pub fn visible(&self) -> Vec<SupportTicket> {
        filter_records(self.tickets.data(), &self.query)
    }

    /// Submits the draft ticket. On acceptance the list is re-read from the
    /// server so the screen shows the authoritative row, not a local copy.
    /// Returns true when the ticket was accepted.
    pub async fn submit(
        &mut self,
        backend: &dyn BillingBackend,
        identity: &Identity,
        customer: &str,
    ) -> bool {
        let Some(request) = self.form.begin_submit(identity.as_str(), customer) else {
            return false;
        };
        let result = backend.create_ticket(request).await;
        let accepted = self.form.complete_submit(&result);
        if accepted {
            self.reload_tickets(backend, Some(identity)).await;
        }
        accepted
    }
}

/// Subscription screen: current subscriptions, the plan catalog, and the
/// subscribe flow.
#[derive(Debug, Default)]
pub struct SubscriptionScreen {
    pub subscriptions: EntityViewModel<Vec<Subscription>>,
    pub plans: EntityViewModel<Vec<SubscriptionPlan>>,
    pub form: SubscribeForm,
    /// Result of the most recent payment confirmation, if any.
    pub payment_notice: Option<BusinessOutcome>,
}

impl SubscriptionScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, backend: &dyn BillingBackend, identity: Option<&Identity>) {
        let plans_ticket = self.plans.begin_catalog_load();
        let subscription_ticket = self.subscriptions.begin_load(identity);
        let email = scoped_email(identity);

        match subscription_ticket {
            Some(subscription_ticket) => {
                let (plans, subscriptions) =
                    tokio::join!(backend.subscription_plans(), backend.subscriptions(&email));
                self.plans.complete(plans_ticket, plans);
                self.subscriptions.complete(subscription_ticket, subscriptions);
            }
            None => {
                let plans = backend.subscription_plans().await;
                self.plans.complete(plans_ticket, plans);
            }
        }
    }

    /// Whether any current subscription already carries this plan.
    pub fn is_current_plan(&self, plan_name: &str) -> bool {
        self.subscriptions
            .data()
            .iter()
            .any(|subscription| subscription.has_plan(plan_name))
    }

    /// Runs the subscribe flow for the opened plan. On acceptance the
    /// subscription list is re-read from the server.
    pub async fn subscribe(
        &mut self,
        backend: &dyn BillingBackend,
        identity: &Identity,
        customer: &str,
    ) -> bool {
        let Some(request) = self.form.begin_submit(customer) else {
            return false;
        };
        let result = backend.create_subscription(request).await;
        let accepted = self.form.complete_submit(&result);
        if accepted {
            if let Some(ticket) = self.subscriptions.begin_load(Some(identity)) {
                let refreshed = backend.subscriptions(identity.as_str()).await;
                self.subscriptions.complete(ticket, refreshed);
            }
        }
        accepted
    }

    /// Confirms a pending enhancement payment. The verdict comes from the
    /// backend payload; an already-settled payment is a business failure,
    /// not a transport error.
    pub async fn confirm_payment(
        &mut self,
        backend: &dyn BillingBackend,
        enhancement_id: &str,
    ) -> Result<(), CoreError> {
        let outcome = backend
            .confirm_payment(ConfirmPaymentRequest {
                enhancement_id: enhancement_id.to_owned(),
            })
            .await?;
        self.payment_notice = Some(outcome);
        Ok(())
    }
}

/// Per-customer activity the admin drills into from the directory.
#[derive(Debug, Clone, Default)]
pub struct CustomerActivity {
    pub subscriptions: Vec<Subscription>,
    pub invoices: Vec<Invoice>,
    pub tickets: Vec<SupportTicket>,
}

/// Admin-side customer directory with search and per-customer drill-in.
#[derive(Debug, Default)]
pub struct AdminDirectory {
    pub customers: EntityViewModel<Vec<Customer>>,
    pub query: FilterQuery,
}

impl AdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, backend: &dyn BillingBackend) {
        let ticket = self.customers.begin_catalog_load();
        let result = backend.customer_directory().await;
        self.customers.complete(ticket, result);
    }

    pub fn visible(&self) -> Vec<Customer> {
        filter_records(self.customers.data(), &self.query)
    }

    /// Fetches one customer's subscriptions, invoices and tickets in
    /// parallel.
    pub async fn customer_activity(
        &self,
        backend: &dyn BillingBackend,
        email: &str,
    ) -> Result<CustomerActivity, CoreError> {
        let (subscriptions, invoices, tickets) = tokio::join!(
            backend.subscriptions(email),
            backend.invoices(email),
            backend.support_tickets(email)
        );
        Ok(CustomerActivity {
            subscriptions: subscriptions?,
            invoices: invoices?,
            tickets: tickets?,
        })
    }
}

/// Account screen: the password-change form and its last outcome.
#[derive(Debug, Default)]
pub struct AccountScreen {
    pub form: PasswordForm,
}

impl AccountScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the password change. Returns true when the backend accepted it;
    /// a payload-level refusal reopens the form with the server's message.
    pub async fn change_password(
        &mut self,
        backend: &dyn BillingBackend,
        identity: &Identity,
    ) -> bool {
        let Some(request) = self.form.begin_submit(identity.as_str()) else {
            return false;
        };
        let result = backend.set_user_password(request).await;
        self.form.complete_submit(&result)
    }
}
