#[cfg(feature = "derive")]
mod container_test {
    use rulewire_di::container::{Container, ContainerBuilder};
    use rulewire_di::error::ContainerError;
    use rulewire_di::instance::InstancePtr;
    use rulewire_di::instance_provider::TypedInstanceProvider;
    use rulewire_di::resolver::SharedPool;
    use rulewire_di::rule::{callback, MethodCall, Rule};
    use rulewire_di::value::{factory, FromValue, Value};
    use rulewire_di::{injectable, injectable_alias, injectable_methods, Injectable};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Injectable)]
    struct C;

    #[derive(Injectable)]
    struct B {
        c: InstancePtr<C>,
    }

    #[derive(Injectable)]
    struct A {
        b: InstancePtr<B>,
    }

    #[derive(Injectable)]
    struct Leaf;

    #[derive(Injectable)]
    struct Pair {
        first: InstancePtr<Leaf>,
        second: InstancePtr<Leaf>,
    }

    #[derive(Injectable)]
    struct SharedDependency;

    #[derive(Injectable)]
    struct Left {
        dependency: InstancePtr<SharedDependency>,
    }

    #[derive(Injectable)]
    struct Right {
        dependency: InstancePtr<SharedDependency>,
    }

    #[derive(Injectable)]
    struct Top {
        left: InstancePtr<Left>,
        right: InstancePtr<Right>,
    }

    #[derive(Injectable)]
    struct Credentials {
        user: String,
        password: String,
    }

    #[derive(Injectable)]
    struct Mixed {
        a: InstancePtr<A>,
        text: String,
        b: InstancePtr<B>,
    }

    #[derive(Injectable)]
    struct Optional {
        dependency: Option<InstancePtr<C>>,
    }

    #[injectable]
    trait BService {
        fn kind(&self) -> &'static str;
    }

    #[derive(Injectable)]
    struct BaseB;

    #[injectable_alias]
    impl BService for BaseB {
        fn kind(&self) -> &'static str {
            "base"
        }
    }

    #[derive(Injectable)]
    struct ExtendedB;

    #[injectable_alias]
    impl BService for ExtendedB {
        fn kind(&self) -> &'static str {
            "extended"
        }
    }

    #[derive(Injectable)]
    #[inject(name = "App::Consumer")]
    struct Consumer {
        #[cfg(feature = "threadsafe")]
        b: InstancePtr<dyn BService + Send + Sync>,
        #[cfg(not(feature = "threadsafe"))]
        b: InstancePtr<dyn BService>,
    }

    #[derive(Injectable)]
    struct Counter {
        #[inject(ignore)]
        value: i64,
    }

    #[injectable_methods]
    impl Counter {
        pub fn add(&mut self, amount: i64) {
            self.value += amount;
        }

        pub fn value(&self) -> i64 {
            self.value
        }

        #[inject(ignore)]
        pub fn reset(&mut self) {
            self.value = 0;
        }
    }

    #[derive(Injectable)]
    struct Total {
        amount: i64,
    }

    fn default_name() -> &'static str {
        "default"
    }

    #[derive(Injectable)]
    struct Settings {
        #[inject(default = "default_name")]
        name: String,
        #[inject(variadic)]
        tags: Vec<String>,
    }

    #[derive(Injectable)]
    #[inject(constructor = "Connection::open")]
    struct Connection {
        dsn: String,
        #[inject(ignore)]
        opened: bool,
    }

    impl Connection {
        fn open(dsn: String) -> Result<Self, ContainerError> {
            if dsn.is_empty() {
                return Err(ContainerError::InvalidArgument {
                    expected: "dsn".to_string(),
                    found: "empty string".to_string(),
                });
            }

            Ok(Self { dsn, opened: true })
        }
    }

    fn container() -> Container {
        ContainerBuilder::new().unwrap().build()
    }

    #[test]
    fn should_create_object_graph_without_rules() {
        let mut container = container();
        let a = container.instance_typed::<A>().unwrap();
        let another = container.instance_typed::<A>().unwrap();

        assert!(!InstancePtr::ptr_eq(&a.b, &another.b));
        assert!(!InstancePtr::ptr_eq(&a.b.c, &another.b.c));
    }

    #[test]
    fn should_share_instances_of_shared_rules() {
        let mut container = container();
        container.add_rule("C", Rule::default().with_shared(true));

        let first = container.instance_typed::<A>().unwrap();
        let second = container.instance_typed::<A>().unwrap();

        assert!(InstancePtr::ptr_eq(&first.b.c, &second.b.c));
        assert!(!InstancePtr::ptr_eq(&first.b, &second.b));
        assert!(InstancePtr::ptr_eq(
            &first.b.c,
            &container.named_instance_typed::<C>("::c").unwrap()
        ));
    }

    #[test]
    fn should_bypass_shared_instance_when_forced() {
        let mut container = container();
        container.add_rule("C", Rule::default().with_shared(true));

        let shared = container.create("C").unwrap();
        let forced = container.create_new("C", vec![]).unwrap();

        assert_ne!(shared, forced);
        assert_eq!(shared, container.create("C").unwrap());
    }

    #[test]
    fn should_force_new_instances_under_shared_rule() {
        let mut container = container();
        container.add_rule("Leaf", Rule::default().with_shared(true));
        container.add_rule("Pair", Rule::default().with_new_instance("Leaf"));

        let pair = container.instance_typed::<Pair>().unwrap();
        let shared = container.instance_typed::<Leaf>().unwrap();

        assert!(!InstancePtr::ptr_eq(&pair.first, &pair.second));
        assert!(!InstancePtr::ptr_eq(&pair.first, &shared));
        assert!(!InstancePtr::ptr_eq(&pair.second, &shared));
    }

    #[test]
    fn should_share_instances_within_object_graph() {
        let mut container = container();
        container.add_rule(
            "Top",
            Rule::default().with_share_instance("SharedDependency"),
        );

        let first = container.instance_typed::<Top>().unwrap();
        let second = container.instance_typed::<Top>().unwrap();

        assert!(InstancePtr::ptr_eq(
            &first.left.dependency,
            &first.right.dependency
        ));
        assert!(InstancePtr::ptr_eq(
            &second.left.dependency,
            &second.right.dependency
        ));
        assert!(!InstancePtr::ptr_eq(
            &first.left.dependency,
            &second.left.dependency
        ));
    }

    #[test]
    fn should_share_instances_from_wildcard_rule() {
        let mut container = container();
        container.add_rule(
            "*",
            Rule::default().with_share_instance("SharedDependency"),
        );

        let top = container.instance_typed::<Top>().unwrap();
        assert!(InstancePtr::ptr_eq(&top.left.dependency, &top.right.dependency));

        assert!(container.instance_typed::<SharedDependency>().is_ok());
        assert!(container.instance_typed::<Left>().is_ok());
    }

    #[test]
    fn should_terminate_mutually_shared_instances() {
        let mut container = container();
        container.add_rule(
            "*",
            Rule::default()
                .with_share_instance("Left")
                .with_share_instance("Right"),
        );

        assert!(container.instance_typed::<Top>().is_ok());
        assert!(container.instance_typed::<Left>().is_ok());
        assert!(container.instance_typed::<Right>().is_ok());
    }

    #[test]
    fn should_not_share_instances_without_rule() {
        let mut container = container();
        let top = container.instance_typed::<Top>().unwrap();

        assert!(!InstancePtr::ptr_eq(&top.left.dependency, &top.right.dependency));
    }

    #[test]
    fn should_match_arguments_by_type() {
        let mut container = container();
        let a = container.create("A").unwrap();
        let b = container.create("B").unwrap();

        let mixed = container
            .create_with(
                "Mixed",
                vec![b.clone(), Value::from("literal"), a.clone()],
                &SharedPool::default(),
            )
            .and_then(InstancePtr::<Mixed>::from_value)
            .unwrap();

        assert!(InstancePtr::ptr_eq(
            &mixed.a,
            &InstancePtr::<A>::from_value(a).unwrap()
        ));
        assert!(InstancePtr::ptr_eq(
            &mixed.b,
            &InstancePtr::<B>::from_value(b).unwrap()
        ));
        assert_eq!(mixed.text, "literal");
    }

    #[test]
    fn should_prefer_supplied_arguments_over_construct_params() {
        let mut container = container();
        container.add_rule(
            "Credentials",
            Rule::default().with_construct_params(vec![Value::from("A"), Value::from("B")]),
        );

        let mut create = |args: Vec<&str>| {
            container
                .create_with(
                    "Credentials",
                    args.into_iter().map(Value::from).collect(),
                    &SharedPool::default(),
                )
                .and_then(InstancePtr::<Credentials>::from_value)
                .unwrap()
        };

        let credentials = create(vec![]);
        assert_eq!((credentials.user.as_str(), credentials.password.as_str()), ("A", "B"));

        let credentials = create(vec!["C", "D"]);
        assert_eq!((credentials.user.as_str(), credentials.password.as_str()), ("C", "D"));

        let credentials = create(vec!["C"]);
        assert_eq!((credentials.user.as_str(), credentials.password.as_str()), ("C", "A"));
    }

    #[test]
    fn should_substitute_null() {
        assert!(container()
            .instance_typed::<Optional>()
            .unwrap()
            .dependency
            .is_some());

        let mut container = container();
        container.add_rule(
            "Optional",
            Rule::default().with_substitution("C", Value::Null),
        );
        assert!(container
            .instance_typed::<Optional>()
            .unwrap()
            .dependency
            .is_none());
    }

    #[test]
    fn should_apply_wildcard_rule() {
        let mut container = container();
        container.add_rule("*", Rule::default().with_shared(true));

        assert!(container.rule("AnyUnregisteredType").is_shared());

        let first = container.instance_typed::<C>().unwrap();
        let second = container.instance_typed::<C>().unwrap();
        assert!(InstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_create_named_instance() {
        let mut container = container();
        container.add_rule("$B", Rule::default().with_instance_of("ExtendedB"));
        container.add_rule(
            "App::Consumer",
            Rule::default().with_construct_params(vec![Value::create("$B")]),
        );

        let consumer = container.instance_typed::<Consumer>().unwrap();
        assert_eq!(consumer.b.kind(), "extended");
    }

    #[test]
    fn should_substitute_interface() {
        let mut container = container();
        container.add_rule(
            "App::Consumer",
            Rule::default().with_substitution("BService", Value::create("BaseB")),
        );

        let consumer = container.instance_typed::<Consumer>().unwrap();
        assert_eq!(consumer.b.kind(), "base");
    }

    #[test]
    fn should_resolve_interface_with_instance_of() {
        let mut container = container();
        container.add_rule("BService", Rule::default().with_instance_of("BaseB"));

        let consumer = container.instance_typed::<Consumer>().unwrap();
        assert_eq!(consumer.b.kind(), "base");
    }

    #[test]
    fn should_fail_to_instantiate_interface() {
        let mut container = container();

        assert_eq!(
            container.instance_typed::<Consumer>().err(),
            Some(ContainerError::Instantiation("bservice".to_string()))
        );
    }

    #[test]
    fn should_fail_on_unknown_type() {
        let mut container = container();

        assert_eq!(
            container.create("Unknown").unwrap_err(),
            ContainerError::TypeNotFound("unknown".to_string())
        );
    }

    #[test]
    fn should_inherit_interface_rule() {
        let mut container = container();
        container.add_rule("BService", Rule::default().with_shared(true));

        assert!(container.rule("ExtendedB").is_shared());

        let first = container.create("ExtendedB").unwrap();
        assert_eq!(first, container.create("ExtendedB").unwrap());
    }

    #[test]
    fn should_call_methods_after_construction() {
        let mut container = container();
        let observed = Arc::new(AtomicI64::new(0));
        let observer = observed.clone();

        container.add_rule(
            "Counter",
            Rule::default()
                .with_call(MethodCall::new("add", vec![Value::from(2)]))
                .with_call(MethodCall::new("add", vec![Value::from(3)]))
                .with_call(MethodCall::new("value", vec![]).with_callback(callback(
                    move |value| {
                        observer.store(i64::from_value(value).unwrap(), Ordering::SeqCst);
                    },
                ))),
        );

        let counter = container.instance_typed::<Counter>().unwrap();

        assert_eq!(counter.value(), 5);
        assert_eq!(observed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn should_call_methods_before_sharing() {
        let mut container = container();
        container.add_rule(
            "Counter",
            Rule::default()
                .with_shared(true)
                .with_call(MethodCall::new("add", vec![Value::from(1)])),
        );

        let first = container.instance_typed::<Counter>().unwrap();
        let second = container.instance_typed::<Counter>().unwrap();

        assert!(InstancePtr::ptr_eq(&first, &second));
        assert_eq!(second.value(), 1);
    }

    #[test]
    fn should_fail_on_unknown_method() {
        let mut container = container();
        container.add_rule(
            "Counter",
            Rule::default().with_call(MethodCall::new("reset", vec![])),
        );

        assert_eq!(
            container.create("Counter").unwrap_err(),
            ContainerError::MethodNotFound {
                type_name: "counter".to_string(),
                method: "reset".to_string(),
            }
        );
    }

    #[test]
    fn should_resolve_method_markers() {
        let mut container = container();
        container.add_rule(
            "Counter",
            Rule::default().with_call(MethodCall::new("add", vec![Value::from(4)])),
        );
        container.add_rule(
            "Total",
            Rule::default().with_construct_params(vec![Value::call_method(
                Value::from("Counter"),
                "value",
                None,
            )]),
        );

        assert_eq!(container.instance_typed::<Total>().unwrap().amount, 4);
    }

    #[test]
    fn should_not_mutate_shared_instances() {
        let mut container = container();
        container.add_rule("Counter", Rule::default().with_shared(true));
        container.add_rule(
            "Total",
            Rule::default().with_construct_params(vec![Value::call_method(
                Value::from("Counter"),
                "add",
                Some(vec![Value::from(1)]),
            )]),
        );
        container.create("Counter").unwrap();

        assert_eq!(
            container.create("Total").unwrap_err(),
            ContainerError::SharedInstanceMutation {
                type_name: "counter".to_string(),
                method: "add".to_string(),
            }
        );
    }

    #[test]
    fn should_use_defaults_and_variadic_parameters() {
        let mut container = container();

        let settings = container.instance_typed::<Settings>().unwrap();
        assert_eq!(settings.name, "default");
        assert!(settings.tags.is_empty());

        let settings = container
            .create_with(
                "Settings",
                vec![Value::from("app"), Value::from("a"), Value::from("b")],
                &SharedPool::default(),
            )
            .and_then(InstancePtr::<Settings>::from_value)
            .unwrap();
        assert_eq!(settings.name, "app");
        assert_eq!(settings.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn should_use_custom_constructor() {
        let mut container = container();
        container.add_rule(
            "Connection",
            Rule::default().with_construct_params(vec![Value::from("sqlite::memory:")]),
        );

        let connection = container.instance_typed::<Connection>().unwrap();
        assert_eq!(connection.dsn, "sqlite::memory:");
        assert!(connection.opened);

    }

    #[test]
    fn should_propagate_constructor_errors() {
        let mut container = container();
        container.add_rule(
            "Connection",
            Rule::default().with_construct_params(vec![Value::from("")]),
        );

        assert_eq!(
            container.create("Connection").unwrap_err(),
            ContainerError::InvalidArgument {
                expected: "dsn".to_string(),
                found: "empty string".to_string(),
            }
        );
        assert_eq!(
            ContainerBuilder::new()
                .unwrap()
                .build()
                .create("Connection")
                .unwrap_err(),
            ContainerError::InvalidArgument {
                expected: "string".to_string(),
                found: "null".to_string(),
            }
        );
    }

    #[test]
    fn should_create_with_factory() {
        let mut container = container();
        container.add_rule(
            "$counter",
            Rule::default()
                .with_factory(factory(|provider, _| {
                    provider.instance("Counter", vec![], &SharedPool::default())
                }))
                .with_call(MethodCall::new("add", vec![Value::from(10)])),
        );

        let counter = container.named_instance_typed::<Counter>("$counter").unwrap();
        assert_eq!(counter.value(), 10);
    }

    #[test]
    fn should_resolve_factory_markers() {
        let mut container = container();
        container.add_rule(
            "Total",
            Rule::default().with_construct_params(vec![Value::factory_with(
                factory(|_, args| {
                    let sum: i64 = args
                        .into_iter()
                        .map(i64::from_value)
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .sum();
                    Ok(Value::from(sum))
                }),
                vec![Value::from(2), Value::from(40)],
            )]),
        );

        assert_eq!(container.instance_typed::<Total>().unwrap().amount, 42);
    }
}
