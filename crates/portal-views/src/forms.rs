use portal_backend::{
    BusinessOutcome, CreateSubscriptionRequest, CreateTicketRequest, SetPasswordRequest,
};
use portal_domain::{CoreError, PlanDetail};

const DEFAULT_TICKET_PRIORITY: &str = "Medium";

/// Lifecycle of a modal form. `Submitting` is a hard lock: no second
/// submission and no close until the in-flight request settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Closed,
    Open,
    Submitting,
}

fn settle(phase: &mut FormPhase, error: &mut Option<String>, result: &Result<BusinessOutcome, CoreError>) -> bool {
    match result {
        Ok(outcome) if outcome.success => {
            *phase = FormPhase::Closed;
            *error = None;
            true
        }
        Ok(outcome) => {
            *phase = FormPhase::Open;
            *error = Some(
                outcome
                    .detail
                    .clone()
                    .unwrap_or_else(|| "the request was not accepted.".to_owned()),
            );
            false
        }
        Err(error_value) => {
            *phase = FormPhase::Open;
            *error = Some(error_value.to_string());
            false
        }
    }
}

/// New-ticket form backing the support desk modal.
#[derive(Debug, Clone, Default)]
pub struct TicketForm {
    phase: FormPhase,
    pub subject: String,
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    pub group: String,
    pub select_type: String,
    error: Option<String>,
}

impl TicketForm {
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self) {
        if self.phase == FormPhase::Submitting {
            return;
        }
        *self = Self::default();
        self.priority = DEFAULT_TICKET_PRIORITY.to_owned();
        self.phase = FormPhase::Open;
    }

    /// Closes the form unless a submission is in flight.
    pub fn request_close(&mut self) -> bool {
        if self.phase == FormPhase::Submitting {
            return false;
        }
        *self = Self::default();
        true
    }

    /// Validates the draft and locks the form for submission. Returns the
    /// request to send, or `None` when validation failed or a submission is
    /// already in flight. Invalid drafts never produce a request.
    pub fn begin_submit(&mut self, email: &str, customer: &str) -> Option<CreateTicketRequest> {
        if self.phase != FormPhase::Open {
            return None;
        }

        let missing = [
            (self.subject.trim().is_empty(), "a subject"),
            (self.description.trim().is_empty(), "a description"),
            (self.issue_type.trim().is_empty(), "an issue type"),
            (customer.trim().is_empty(), "a customer record"),
            (email.trim().is_empty(), "a signed-in email"),
        ]
        .iter()
        .find_map(|(is_missing, label)| is_missing.then_some(*label));
        if let Some(label) = missing {
            self.error = Some(format!("The ticket needs {label} before it can be submitted."));
            return None;
        }

        self.error = None;
        self.phase = FormPhase::Submitting;
        Some(CreateTicketRequest {
            subject: self.subject.trim().to_owned(),
            description: self.description.trim().to_owned(),
            email: email.trim().to_owned(),
            customer: customer.trim().to_owned(),
            issue_type: self.issue_type.trim().to_owned(),
            priority: if self.priority.trim().is_empty() {
                DEFAULT_TICKET_PRIORITY.to_owned()
            } else {
                self.priority.trim().to_owned()
            },
            group: self.group.trim().to_owned(),
            select_type: self.select_type.trim().to_owned(),
        })
    }

    /// Settles the in-flight submission. Returns true when the server
    /// accepted it, in which case the form is closed and the caller should
    /// refresh the ticket list from the server.
    pub fn complete_submit(&mut self, result: &Result<BusinessOutcome, CoreError>) -> bool {
        if self.phase != FormPhase::Submitting {
            return false;
        }
        settle(&mut self.phase, &mut self.error, result)
    }
}

/// Plan-selection form for taking out a new subscription.
#[derive(Debug, Clone)]
pub struct SubscribeForm {
    phase: FormPhase,
    pub plan: String,
    pub cost: f64,
    pub qty: f64,
    error: Option<String>,
}

impl Default for SubscribeForm {
    fn default() -> Self {
        Self {
            phase: FormPhase::Closed,
            plan: String::new(),
            cost: 0.0,
            qty: 1.0,
            error: None,
        }
    }
}

impl SubscribeForm {
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self, plan: &str, cost: f64) {
        if self.phase == FormPhase::Submitting {
            return;
        }
        *self = Self::default();
        self.plan = plan.trim().to_owned();
        self.cost = cost;
        self.phase = FormPhase::Open;
    }

    pub fn request_close(&mut self) -> bool {
        if self.phase == FormPhase::Submitting {
            return false;
        }
        *self = Self::default();
        true
    }

    pub fn begin_submit(&mut self, customer: &str) -> Option<CreateSubscriptionRequest> {
        if self.phase != FormPhase::Open {
            return None;
        }
        if self.plan.is_empty() {
            self.error = Some("Pick a plan before subscribing.".to_owned());
            return None;
        }
        if customer.trim().is_empty() {
            self.error = Some("No customer record is linked to this account.".to_owned());
            return None;
        }
        if self.qty <= 0.0 {
            self.error = Some("Quantity must be at least one.".to_owned());
            return None;
        }

        self.error = None;
        self.phase = FormPhase::Submitting;
        Some(CreateSubscriptionRequest {
            customer: customer.trim().to_owned(),
            plan_details: vec![PlanDetail {
                plan: self.plan.clone(),
                qty: self.qty,
                cost: self.cost,
            }],
        })
    }

    pub fn complete_submit(&mut self, result: &Result<BusinessOutcome, CoreError>) -> bool {
        if self.phase != FormPhase::Submitting {
            return false;
        }
        settle(&mut self.phase, &mut self.error, result)
    }
}

/// Password-change form on the account screen.
#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    phase: FormPhase,
    pub new_password: String,
    pub confirm_password: String,
    error: Option<String>,
}

impl PasswordForm {
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn open(&mut self) {
        if self.phase == FormPhase::Submitting {
            return;
        }
        *self = Self::default();
        self.phase = FormPhase::Open;
    }

    pub fn request_close(&mut self) -> bool {
        if self.phase == FormPhase::Submitting {
            return false;
        }
        *self = Self::default();
        true
    }

    pub fn begin_submit(&mut self, email: &str) -> Option<SetPasswordRequest> {
        if self.phase != FormPhase::Open {
            return None;
        }
        if self.new_password.is_empty() {
            self.error = Some("Enter a new password.".to_owned());
            return None;
        }
        if self.new_password != self.confirm_password {
            self.error = Some("The passwords do not match.".to_owned());
            return None;
        }
        if email.trim().is_empty() {
            self.error = Some("No signed-in email to change the password for.".to_owned());
            return None;
        }

        self.error = None;
        self.phase = FormPhase::Submitting;
        Some(SetPasswordRequest {
            email: email.trim().to_owned(),
            new_password: self.new_password.clone(),
        })
    }

    pub fn complete_submit(&mut self, result: &Result<BusinessOutcome, CoreError>) -> bool {
        if self.phase != FormPhase::Submitting {
            return false;
        }
        settle(&mut self.phase, &mut self.error, result)
    }
}
