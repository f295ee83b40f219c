use portal_domain::Identity;

use crate::auth::SessionStatus;

/// Screens the portal can show. `Login` is the only one reachable without
/// an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    CustomerDashboard,
    AdminDashboard,
    Invoices,
    Subscription,
    SupportTickets,
    Account,
}

impl Route {
    pub fn requires_session(self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// What the shell should do for a requested route given the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session status is still unknown. Show the loading state and do not
    /// redirect anywhere yet.
    RenderLoading,
    Render,
    RedirectToLogin,
    Redirect(Route),
}

/// Decides route access from session status alone. The admin email match
/// only picks a landing page; it grants nothing, the backend enforces its
/// own permissions on every call.
#[derive(Debug, Clone)]
pub struct RouteGate {
    admin_email: String,
}

impl RouteGate {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into().trim().to_owned(),
        }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        !self.admin_email.is_empty() && identity.as_str().eq_ignore_ascii_case(&self.admin_email)
    }

    fn landing(&self, identity: &Identity) -> Route {
        if self.is_admin(identity) {
            Route::AdminDashboard
        } else {
            Route::CustomerDashboard
        }
    }

    pub fn decide(&self, status: &SessionStatus, route: Route) -> RouteDecision {
        match status {
            SessionStatus::Unknown => RouteDecision::RenderLoading,
            SessionStatus::Unauthenticated => {
                if route.requires_session() {
                    RouteDecision::RedirectToLogin
                } else {
                    RouteDecision::Render
                }
            }
            SessionStatus::Authenticated(identity) => match route {
                Route::Login => RouteDecision::Redirect(self.landing(identity)),
                Route::AdminDashboard if !self.is_admin(identity) => {
                    RouteDecision::Redirect(Route::CustomerDashboard)
                }
                _ => RouteDecision::Render,
            },
        }
    }
}
