//! Performance logging through an interceptor.
//!
//! Run with `RUST_LOG=debug cargo run --example interception` to also see the
//! container's own log lines.

use scopewire::{ConstructError, Injectable, Interceptor, Lifetime, Resolver, ServiceCollection};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: String,
    name: String,
}

trait UserRepository: Send + Sync {
    fn get_user(&self, user_id: &str) -> User;
}

struct SqlUserRepository;

impl UserRepository for SqlUserRepository {
    fn get_user(&self, user_id: &str) -> User {
        // Simulate database query
        thread::sleep(Duration::from_millis(100));
        User {
            id: user_id.to_string(),
            name: "Test User".to_string(),
        }
    }
}

impl Injectable for SqlUserRepository {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(SqlUserRepository)
    }
}

struct LoggedUserRepository(Interceptor<dyn UserRepository>);

impl UserRepository for LoggedUserRepository {
    fn get_user(&self, user_id: &str) -> User {
        self.0.invoke("get_user", &[&user_id], |inner| inner.get_user(user_id))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let performance_logging = Interceptor::<dyn UserRepository>::builder()
        .before(|_, call| println!("Starting {}.{}{:?}", call.target, call.operation, call.args))
        .after(|_, call, result| {
            let found = result.downcast_ref::<User>().map(|u| u.name.as_str());
            println!(
                "Completed {}.{} in {:.2?} -> {:?}",
                call.target,
                call.operation,
                call.elapsed(),
                found
            );
        })
        .with_timing()
        .into_factory(|interceptor| Arc::new(LoggedUserRepository(interceptor)) as Arc<dyn UserRepository>);

    let mut services = ServiceCollection::new();
    services.bind::<dyn UserRepository, SqlUserRepository, _>(Lifetime::Singleton, |r| r);
    services.add_interceptor::<dyn UserRepository, _>(performance_logging);
    let provider = services.build();

    let repo = provider.get_required::<dyn UserRepository>();
    let user = repo.get_user("123");
    assert_eq!(user.id, "123");
}
