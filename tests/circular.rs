use scopewire::{ConstructError, ContainerOptions, DiError, Injectable, Lifetime, Resolver, ServiceCollection};
use std::sync::Arc;

struct SelfReferencing;

impl Injectable for SelfReferencing {
    type Deps = (Arc<SelfReferencing>,);
    fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
        Ok(SelfReferencing)
    }
}

struct ServiceA;
struct ServiceB;
struct ServiceC;

impl Injectable for ServiceA {
    type Deps = (Arc<ServiceB>,);
    fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
        Ok(ServiceA)
    }
}

impl Injectable for ServiceB {
    type Deps = (Arc<ServiceC>,);
    fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
        Ok(ServiceB)
    }
}

impl Injectable for ServiceC {
    type Deps = (Arc<ServiceA>,);
    fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
        Ok(ServiceC)
    }
}

fn short(path: &[&'static str]) -> Vec<String> {
    path.iter()
        .map(|name| name.rsplit("::").next().unwrap_or(name).to_string())
        .collect()
}

#[test]
fn test_self_circular_dependency() {
    let mut sc = ServiceCollection::new();
    sc.add_transient::<SelfReferencing>();
    let sp = sc.build();

    match sp.get::<SelfReferencing>() {
        Err(DiError::Circular(path)) => {
            assert_eq!(short(&path), vec!["SelfReferencing", "SelfReferencing"]);
        }
        other => panic!("expected Circular, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_three_way_cycle_reports_full_chain() {
    for lifetime in [Lifetime::Transient, Lifetime::Singleton, Lifetime::Scoped] {
        let mut sc = ServiceCollection::new();
        sc.register_with::<ServiceA>(lifetime);
        sc.register_with::<ServiceB>(lifetime);
        sc.register_with::<ServiceC>(lifetime);
        let sp = sc.build();
        let _scope = sp.create_scope();

        match sp.get::<ServiceB>() {
            Err(DiError::Circular(path)) => {
                assert_eq!(short(&path), vec!["ServiceB", "ServiceC", "ServiceA", "ServiceB"]);
            }
            other => panic!("{}: expected Circular, got {:?}", lifetime, other.map(|_| ())),
        }
    }
}

#[test]
fn test_cycle_error_leaves_container_usable() {
    struct Standalone;
    impl Injectable for Standalone {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Standalone)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<ServiceA>();
    sc.add_singleton::<ServiceB>();
    sc.add_singleton::<ServiceC>();
    sc.add_singleton::<Standalone>();
    let sp = sc.build();

    assert!(sp.get::<ServiceA>().is_err());
    // Retrying hits the same cycle instead of deadlocking on a half-built cell
    assert!(matches!(sp.get::<ServiceA>(), Err(DiError::Circular(_))));
    assert!(sp.get::<Standalone>().is_ok());
}

#[test]
fn test_diamond_is_not_a_cycle() {
    struct Shared;
    impl Injectable for Shared {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Shared)
        }
    }
    struct Left(Arc<Shared>);
    impl Injectable for Left {
        type Deps = (Arc<Shared>,);
        fn construct((s,): Self::Deps) -> Result<Self, ConstructError> {
            Ok(Left(s))
        }
    }
    struct Right(Arc<Shared>);
    impl Injectable for Right {
        type Deps = (Arc<Shared>,);
        fn construct((s,): Self::Deps) -> Result<Self, ConstructError> {
            Ok(Right(s))
        }
    }
    struct Top(Arc<Left>, Arc<Right>);
    impl Injectable for Top {
        type Deps = (Arc<Left>, Arc<Right>);
        fn construct((l, r): Self::Deps) -> Result<Self, ConstructError> {
            Ok(Top(l, r))
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Shared>();
    sc.add_transient::<Left>();
    sc.add_transient::<Right>();
    sc.add_transient::<Top>();
    let sp = sc.build();

    let top = sp.get_required::<Top>();
    assert!(Arc::ptr_eq(&top.0 .0, &top.1 .0));
}

#[test]
fn test_depth_limit() {
    struct L0;
    struct L1;
    struct L2;
    impl Injectable for L0 {
        type Deps = (Arc<L1>,);
        fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
            Ok(L0)
        }
    }
    impl Injectable for L1 {
        type Deps = (Arc<L2>,);
        fn construct(_: Self::Deps) -> Result<Self, ConstructError> {
            Ok(L1)
        }
    }
    impl Injectable for L2 {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(L2)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_transient::<L0>();
    sc.add_transient::<L1>();
    sc.add_transient::<L2>();
    sc.with_options(ContainerOptions::default().max_depth(2));
    let sp = sc.build();

    assert!(matches!(sp.get::<L0>(), Err(DiError::DepthExceeded(2))));
    assert!(sp.get::<L1>().is_ok());
}

#[test]
fn test_error_message_shows_path() {
    let err = DiError::Circular(vec!["A", "B", "A"]);
    assert_eq!(err.to_string(), "Circular dependency: A -> B -> A");
}
