use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use portal_backend::{FrappeBillingBackend, FrappeConfig, ReqwestRpcTransport};
use portal_domain::{CoreError, Identity};
use portal_session::{
    Credentials, FrappeAuthProvider, Route, RouteDecision, RouteGate, SessionContext,
};
use portal_views::{
    AdminDirectory, CustomerDashboard, InvoiceScreen, SubscriptionScreen, TicketDesk,
};

const ENV_LOGIN_EMAIL: &str = "PORTAL_LOGIN_EMAIL";
const ENV_LOGIN_PASSWORD: &str = "PORTAL_LOGIN_PASSWORD";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_cli_flags()?;
    let config = portal_config::load_from_env().map_err(|error| {
        CoreError::Configuration(format!("failed to load portal configuration: {error}"))
    })?;

    let frappe_config = FrappeConfig::from_settings(
        config.api.base_url.clone(),
        config.api.request_timeout_secs,
    )?;
    let transport = Arc::new(ReqwestRpcTransport::with_timeout(
        frappe_config.base_url.clone(),
        Duration::from_secs(config.api.request_timeout_secs),
    )?);
    let backend = FrappeBillingBackend::with_transport(frappe_config, transport.clone());
    let auth = FrappeAuthProvider::new(transport);

    let mut session = SessionContext::new();
    session.resolve(&auth).await?;

    if session.identity().is_none() {
        if let Some(credentials) = credentials_from_env(cli.email.as_deref())? {
            let identity = session.login(&auth, &credentials).await?;
            tracing::info!(identity = identity.as_str(), "signed in");
        }
    }

    let gate = RouteGate::new(config.access.admin_email.clone());
    let requested = cli.route.unwrap_or(Route::CustomerDashboard);
    let route = match gate.decide(session.status(), requested) {
        RouteDecision::Render => requested,
        RouteDecision::Redirect(target) => {
            tracing::info!(?requested, ?target, "redirected");
            target
        }
        RouteDecision::RedirectToLogin => {
            anyhow::bail!(
                "not signed in. Set {ENV_LOGIN_EMAIL} and {ENV_LOGIN_PASSWORD} (or pass --email) to sign in."
            );
        }
        RouteDecision::RenderLoading => {
            anyhow::bail!("session status could not be determined");
        }
    };

    let identity = session.identity().cloned();
    render_route(&backend, route, identity.as_ref()).await?;
    Ok(())
}

async fn render_route(
    backend: &FrappeBillingBackend,
    route: Route,
    identity: Option<&Identity>,
) -> Result<()> {
    match route {
        Route::Login => {
            println!("Signed out. Nothing to show.");
        }
        Route::CustomerDashboard | Route::Account => {
            let mut dashboard = CustomerDashboard::new();
            dashboard.load(backend, identity).await;
            print_section_error("dashboard", dashboard.profile.error());
            match dashboard.profile.data() {
                Some(customer) => println!(
                    "Customer: {} <{}>",
                    customer.customer_name, customer.custom_email
                ),
                None => println!("No customer record linked to this account."),
            }
            println!("Subscriptions: {}", dashboard.subscriptions.data().len());
            for subscription in dashboard.subscriptions.data() {
                let plans = subscription
                    .plans
                    .iter()
                    .map(|detail| detail.plan.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  {} [{}] {}", subscription.name, subscription.status, plans);
            }
        }
        Route::Invoices => {
            let mut screen = InvoiceScreen::new();
            screen.load(backend, identity).await;
            print_section_error("invoices", screen.invoices.error());
            println!("Invoices: {}", screen.invoices.data().len());
            for invoice in screen.visible() {
                println!(
                    "  {} {} {:.2} {} [{}]",
                    invoice.name,
                    invoice.posting_date,
                    invoice.grand_total,
                    invoice.currency,
                    invoice.status
                );
            }
        }
        Route::Subscription => {
            let mut screen = SubscriptionScreen::new();
            screen.load(backend, identity).await;
            print_section_error("plans", screen.plans.error());
            println!("Available plans: {}", screen.plans.data().len());
            for plan in screen.plans.data() {
                let marker = if screen.is_current_plan(&plan.name) {
                    " (current)"
                } else {
                    ""
                };
                println!("  {} {:.2} {}{}", plan.name, plan.cost, plan.currency, marker);
            }
        }
        Route::SupportTickets => {
            let mut desk = TicketDesk::new();
            desk.load(backend, identity).await;
            print_section_error("tickets", desk.tickets.error());
            println!("Support tickets: {}", desk.tickets.data().len());
            for ticket in desk.visible() {
                println!(
                    "  {} [{}/{}] {}",
                    ticket.name, ticket.status, ticket.priority, ticket.subject
                );
            }
        }
        Route::AdminDashboard => {
            let mut directory = AdminDirectory::new();
            directory.load(backend).await;
            print_section_error("customers", directory.customers.error());
            println!("Customers: {}", directory.customers.data().len());
            for customer in directory.visible() {
                println!(
                    "  {} <{}> {}",
                    customer.customer_name,
                    customer.custom_email,
                    customer.custom_billing_type.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

fn print_section_error(section: &str, error: Option<&str>) {
    if let Some(error) = error {
        println!("warning: {section} could not be refreshed: {error}");
    }
}

fn credentials_from_env(cli_email: Option<&str>) -> Result<Option<Credentials>, CoreError> {
    let email = cli_email
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var(ENV_LOGIN_EMAIL).ok())
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());
    let Some(email) = email else {
        return Ok(None);
    };

    let password = std::env::var(ENV_LOGIN_PASSWORD).unwrap_or_default();
    if password.is_empty() {
        return Err(CoreError::Configuration(format!(
            "{ENV_LOGIN_PASSWORD} is not set. Export it to sign in as {email}."
        )));
    }

    Ok(Some(Credentials { email, password }))
}

#[derive(Debug, Default)]
struct CliFlags {
    route: Option<Route>,
    email: Option<String>,
}

fn parse_cli_flags() -> Result<CliFlags, CoreError> {
    parse_args(std::env::args().skip(1))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliFlags, CoreError> {
    let mut flags = CliFlags::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--route" => {
                let value = args.next().ok_or_else(|| {
                    CoreError::Configuration(
                        "Missing value after --route. Use --route <dashboard|invoices|subscription|tickets|account|admin>."
                            .to_owned(),
                    )
                })?;
                flags.route = Some(parse_route(&value)?);
            }
            "--email" => {
                let value = args.next().ok_or_else(|| {
                    CoreError::Configuration("Missing value after --email.".to_owned())
                })?;
                flags.email = Some(value);
            }
            "--help" | "-h" => {
                print_cli_help();
                std::process::exit(0);
            }
            value if value.starts_with("--") => {
                return Err(CoreError::Configuration(format!(
                    "Unknown flag '{value}'. Run with --help for valid flags."
                )));
            }
            unknown => {
                return Err(CoreError::Configuration(format!(
                    "Unexpected argument '{unknown}'. Run with --help for valid flags."
                )));
            }
        }
    }

    Ok(flags)
}

fn parse_route(raw: &str) -> Result<Route, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "dashboard" => Ok(Route::CustomerDashboard),
        "admin" => Ok(Route::AdminDashboard),
        "invoices" => Ok(Route::Invoices),
        "subscription" => Ok(Route::Subscription),
        "tickets" => Ok(Route::SupportTickets),
        "account" => Ok(Route::Account),
        "login" => Ok(Route::Login),
        other => Err(CoreError::Configuration(format!(
            "Unknown route '{other}'. Expected dashboard, admin, invoices, subscription, tickets, account, or login."
        ))),
    }
}

fn print_cli_help() {
    println!("Usage: portal-app [--route <dashboard|invoices|subscription|tickets|account|admin>] [--email <email>]");
    println!();
    println!("  --route <route>   Screen to render after sign-in (default: dashboard)");
    println!("  --email <email>   Sign in as this account; password comes from PORTAL_LOGIN_PASSWORD");
    println!("  --help            Show this help message");
}
