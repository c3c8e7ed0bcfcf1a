use rulewire::bootstrap::Bootstrap;
use rulewire::config::ContainerConfig;
use rulewire_di::instance::InstancePtr;
use rulewire_di::instance_provider::TypedInstanceProvider;
use rulewire_di::{injectable_methods, Injectable};

#[derive(Injectable)]
struct Messages {
    salutation: String,
}

#[injectable_methods]
impl Messages {
    pub fn greeting(&self, name: String) -> String {
        format!("{}, {name}", self.salutation)
    }
}

#[derive(Injectable)]
struct Greeter {
    message: String,
    messages: InstancePtr<Messages>,
    #[inject(ignore)]
    punctuation: String,
}

#[injectable_methods]
impl Greeter {
    pub fn set_punctuation(&mut self, punctuation: String) {
        self.punctuation = punctuation;
    }
}

fn main() {
    // RULEWIRE_* environment variables and rulewire.json can further change the config
    let config = ContainerConfig::init_from_environment()
        .expect("error reading config")
        .with_rule_file(concat!(env!("CARGO_MANIFEST_DIR"), "/examples/rules.json"));

    let mut container = Bootstrap::new(config)
        .build()
        .expect("error bootstrapping container");

    let first = container
        .instance_typed::<Greeter>()
        .expect("error creating Greeter");
    let second = container
        .instance_typed::<Greeter>()
        .expect("error creating Greeter");

    // prints "Hello, World!"
    println!("{}{}", first.message, first.punctuation);

    // Messages are shared by the wildcard rule, while Greeter opts out - prints "false true"
    println!(
        "{} {}",
        InstancePtr::ptr_eq(&first, &second),
        InstancePtr::ptr_eq(&first.messages, &second.messages)
    );
}
