use scopewire::{ConstructError, Injectable, Interceptor, Lifetime, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

trait Calculator: Send + Sync {
    fn add(&self, a: i64, b: i64) -> i64;
    fn name(&self) -> String;
}

struct BasicCalculator {
    label: &'static str,
}

impl Calculator for BasicCalculator {
    fn add(&self, a: i64, b: i64) -> i64 {
        a + b
    }

    fn name(&self) -> String {
        self.label.to_string()
    }
}

impl Injectable for BasicCalculator {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(BasicCalculator { label: "basic" })
    }
}

struct InterceptedCalculator(Interceptor<dyn Calculator>);

impl Calculator for InterceptedCalculator {
    fn add(&self, a: i64, b: i64) -> i64 {
        self.0.invoke("add", &[&a, &b], |inner| inner.add(a, b))
    }

    // Plain data: no interception
    fn name(&self) -> String {
        self.0.inner().name()
    }
}

struct Named(&'static str, Arc<dyn Calculator>);

impl Calculator for Named {
    fn add(&self, a: i64, b: i64) -> i64 {
        self.1.add(a, b)
    }

    fn name(&self) -> String {
        format!("{}({})", self.0, self.1.name())
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

#[test]
fn callbacks_run_in_registration_order_around_the_call() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let (b1, b2, a1, a2) = (log.clone(), log.clone(), log.clone(), log.clone());

    let factory = Interceptor::<dyn Calculator>::builder()
        .before(move |_, call| push(&b1, format!("b1:{}", call.operation)))
        .before(move |_, _| push(&b2, "b2"))
        .after(move |_, _, result| {
            let value = result.downcast_ref::<i64>().copied().unwrap_or_default();
            push(&a1, format!("a1:{}", value));
        })
        .after(move |_, call, _| push(&a2, format!("a2:{:?}", call.args)))
        .into_factory(|interceptor| Arc::new(InterceptedCalculator(interceptor)) as Arc<dyn Calculator>);

    let mut sc = ServiceCollection::new();
    sc.bind_transient::<dyn Calculator, BasicCalculator, _>(|c| c);
    sc.add_interceptor::<dyn Calculator, _>(factory);
    let sp = sc.build();

    let calc = sp.get_required::<dyn Calculator>();
    assert_eq!(calc.add(2, 3), 5);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["b1:add", "b2", "a1:5", "a2:[2, 3]"]
    );

    // Plain data access is not intercepted
    log.lock().unwrap().clear();
    assert_eq!(calc.name(), "basic");
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn real_call_runs_between_before_and_after() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let (before, after, real) = (log.clone(), log.clone(), log.clone());

    let interceptor = Interceptor::new(Arc::new(BasicCalculator { label: "x" }) as Arc<dyn Calculator>)
        .before(move |_, _| push(&before, "before"))
        .after(move |_, _, _| push(&after, "after"));

    let result = interceptor.invoke("add", &[&1i64, &1i64], |inner| {
        push(&real, "real");
        inner.add(1, 1)
    });

    assert_eq!(result, 2);
    assert_eq!(*log.lock().unwrap(), vec!["before", "real", "after"]);
}

#[test]
fn factories_compose_in_registration_order() {
    let mut sc = ServiceCollection::new();
    sc.bind_transient::<dyn Calculator, BasicCalculator, _>(|c| c);
    sc.add_interceptor::<dyn Calculator, _>(|inner| Arc::new(Named("f1", inner)) as Arc<dyn Calculator>);
    sc.add_interceptor::<dyn Calculator, _>(|inner| Arc::new(Named("f2", inner)) as Arc<dyn Calculator>);
    let sp = sc.build();

    assert_eq!(sp.get_required::<dyn Calculator>().name(), "f2(f1(basic))");
}

#[test]
fn interception_applied_once_per_constructed_instance() {
    let wrapped = Arc::new(AtomicUsize::new(0));
    let counter = wrapped.clone();

    let mut sc = ServiceCollection::new();
    sc.bind::<dyn Calculator, BasicCalculator, _>(Lifetime::Singleton, |c| c);
    sc.add_interceptor::<dyn Calculator, _>(move |inner| {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(Named("once", inner)) as Arc<dyn Calculator>
    });
    let sp = sc.build();

    let a = sp.get_required::<dyn Calculator>();
    let b = sp.get_required::<dyn Calculator>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.name(), "once(basic)");
    assert_eq!(wrapped.load(Ordering::SeqCst), 1);
}

#[test]
fn consumer_interceptor_does_not_wrap_its_dependencies() {
    struct Consumer {
        calc: Arc<dyn Calculator>,
        wrapped: bool,
    }
    impl Injectable for Consumer {
        type Deps = (Arc<dyn Calculator>,);
        fn construct((calc,): Self::Deps) -> Result<Self, ConstructError> {
            Ok(Consumer { calc, wrapped: false })
        }
    }

    let mut sc = ServiceCollection::new();
    sc.bind_transient::<dyn Calculator, BasicCalculator, _>(|c| c);
    sc.add_transient::<Consumer>();
    sc.add_interceptor::<Consumer, _>(|inner| {
        Arc::new(Consumer {
            calc: inner.calc.clone(),
            wrapped: true,
        })
    });
    let sp = sc.build();

    let consumer = sp.get_required::<Consumer>();
    assert!(consumer.wrapped);
    assert_eq!(consumer.calc.name(), "basic");
}

#[test]
fn interceptor_for_concrete_type_wraps_fresh_transients() {
    #[derive(Debug)]
    struct Counter(usize);
    impl Injectable for Counter {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Counter(1))
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_transient::<Counter>();
    sc.add_interceptor::<Counter, _>(|inner| Arc::new(Counter(inner.0 * 10)));
    sc.add_interceptor::<Counter, _>(|inner| Arc::new(Counter(inner.0 + 1)));
    let sp = sc.build();

    assert_eq!(sp.get_required::<Counter>().0, 11);
    assert_eq!(sp.get_required::<Counter>().0, 11);
}
