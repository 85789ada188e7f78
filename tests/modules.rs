use scopewire::{
    ConstructError, DiError, DiResult, Injectable, Resolver, ServiceCollection, ServiceModule,
};
use std::sync::Arc;

struct DatabaseConfig {
    url: &'static str,
}

impl Injectable for DatabaseConfig {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(DatabaseConfig { url: "postgres://db" })
    }
}

struct UserStore {
    config: Arc<DatabaseConfig>,
}

impl Injectable for UserStore {
    type Deps = (Arc<DatabaseConfig>,);
    fn construct((config,): Self::Deps) -> Result<Self, ConstructError> {
        Ok(UserStore { config })
    }
}

struct DatabaseModule;

impl ServiceModule for DatabaseModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        services.add_singleton::<DatabaseConfig>();
        Ok(())
    }
}

struct UserModule {
    enabled: bool,
}

impl ServiceModule for UserModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        if !self.enabled {
            return Err(DiError::NotFound("UserModule disabled"));
        }
        services.add_scoped::<UserStore>();
        Ok(())
    }
}

#[test]
fn modules_compose_into_one_collection() {
    let mut services = ServiceCollection::new();
    services
        .add_module(DatabaseModule)
        .unwrap()
        .add_module(UserModule { enabled: true })
        .unwrap();

    let provider = services.build();
    let _scope = provider.create_scope();
    assert_eq!(provider.get_required::<UserStore>().config.url, "postgres://db");
}

#[test]
fn module_errors_propagate() {
    let mut services = ServiceCollection::new();
    let err = services.add_module(UserModule { enabled: false }).unwrap_err();
    assert!(matches!(err, DiError::NotFound(_)));
    assert!(services.is_empty());
}

#[test]
fn closures_are_modules() {
    let mut services = ServiceCollection::new();
    services
        .add_module(|s: &mut ServiceCollection| -> DiResult<()> {
            s.add_instance(5u8);
            Ok(())
        })
        .unwrap();

    assert_eq!(*services.build().get_required::<u8>(), 5);
}
