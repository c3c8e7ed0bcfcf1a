use rulewire_di::container::ContainerBuilder;
use rulewire_di::instance::InstancePtr;
use rulewire_di::instance_provider::TypedInstanceProvider;
use rulewire_di::rule::{MethodCall, Rule};
use rulewire_di::value::Value;
use rulewire_di::{injectable, injectable_alias, injectable_methods, Injectable};

#[injectable]
trait Storage {
    fn describe(&self) -> String;
}

#[derive(Injectable)]
struct FileStorage {
    path: String,
}

#[injectable_alias]
impl Storage for FileStorage {
    fn describe(&self) -> String {
        format!("file storage at {}", self.path)
    }
}

#[derive(Injectable)]
struct Logger {
    #[inject(ignore)]
    prefix: String,
}

#[injectable_methods]
impl Logger {
    pub fn set_prefix(&mut self, prefix: String) {
        self.prefix = prefix;
    }
}

#[derive(Injectable)]
struct Service {
    storage: InstancePtr<dyn Storage + Send + Sync>,
    logger: InstancePtr<Logger>,
}

//noinspection DuplicatedCode
fn main() {
    let mut container = ContainerBuilder::new()
        .expect("error initializing ContainerBuilder")
        .build();

    // "$uploads" is a virtual identifier - a named FileStorage with its own path
    container.add_rule(
        "$uploads",
        Rule::default()
            .with_instance_of("FileStorage")
            .with_construct_params(vec![Value::from("/var/uploads")]),
    );

    // Storage is abstract, so services get the named instance instead
    container.add_rule(
        "Service",
        Rule::default().with_substitution("Storage", Value::create("$uploads")),
    );

    // a single logger is shared by everything and configured after construction
    container.add_rule(
        "Logger",
        Rule::default()
            .with_shared(true)
            .with_call(MethodCall::new("set_prefix", vec![Value::from("[app]")])),
    );

    let first = container
        .instance_typed::<Service>()
        .expect("error creating Service");
    let second = container
        .instance_typed::<Service>()
        .expect("error creating Service");

    // prints "[app] file storage at /var/uploads"
    println!("{} {}", first.logger.prefix, first.storage.describe());

    // prints "true"
    println!("{}", InstancePtr::ptr_eq(&first.logger, &second.logger));
}
