//! Request handling with scoped services.
//!
//! Every request gets its own scope: the `UserContext` and `AuditLogger` are
//! shared by everything resolved while handling it, and discarded after.
//!
//! Run with `cargo run --example request_scope`.

use scopewire::{ConstructError, DiResult, Injectable, Resolver, ServiceCollection, ServiceProvider};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

struct UserContext {
    request_id: u64,
    current_user: Mutex<Option<String>>,
}

impl Injectable for UserContext {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(UserContext {
            request_id: NEXT_REQUEST.fetch_add(1, Ordering::Relaxed),
            current_user: Mutex::new(None),
        })
    }
}

struct AuditLogger {
    context: Arc<UserContext>,
}

impl AuditLogger {
    fn log_action(&self, action: &str) {
        let user = self.context.current_user.lock().unwrap().clone();
        println!(
            "[Request {}] User {}: {}",
            self.context.request_id,
            user.as_deref().unwrap_or("<anonymous>"),
            action
        );
    }
}

impl Injectable for AuditLogger {
    type Deps = (Arc<UserContext>,);
    fn construct((context,): Self::Deps) -> Result<Self, ConstructError> {
        Ok(AuditLogger { context })
    }
}

struct UserService {
    context: Arc<UserContext>,
    logger: Arc<AuditLogger>,
}

impl UserService {
    fn perform_action(&self, action: &str) {
        self.logger.log_action(action);
    }
}

impl Injectable for UserService {
    type Deps = (Arc<UserContext>, Arc<AuditLogger>);
    fn construct((context, logger): Self::Deps) -> Result<Self, ConstructError> {
        Ok(UserService { context, logger })
    }
}

fn handle_request(provider: &ServiceProvider, username: &str, action: &str) -> DiResult<()> {
    let _scope = provider.create_scope();
    let service = provider.get::<UserService>()?;
    *service.context.current_user.lock().unwrap() = Some(username.to_string());
    service.perform_action(action);
    Ok(())
}

fn main() -> DiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut services = ServiceCollection::new();
    services.add_scoped::<UserContext>();
    services.add_scoped::<AuditLogger>();
    services.add_transient::<UserService>();
    let provider = services.build();

    handle_request(&provider, "alice", "view_profile")?;
    handle_request(&provider, "bob", "update_settings")?;

    // Outside a request there is no scope to resolve from
    if let Err(err) = provider.get::<UserService>() {
        println!("Outside a request: {}", err);
    }
    Ok(())
}
