use rulewire_di::container::ContainerBuilder;
use rulewire_di::instance::InstancePtr;
use rulewire_di::instance_provider::TypedInstanceProvider;
use rulewire_di::{injectable, injectable_alias, Injectable};

// this is a trait we would like to use as a dependency
#[injectable]
trait Greeter {
    fn greet(&self);
}

// this is a concrete type implementing the above trait
#[derive(Injectable)]
struct EnglishGreeter;

// we're telling the container that EnglishGreeter is a Greeter
#[injectable_alias]
impl Greeter for EnglishGreeter {
    fn greet(&self) {
        println!("Hello world!");
    }
}

// this type depends on a concrete type, which gets constructed automatically
#[derive(Injectable)]
struct Application {
    greeter: InstancePtr<EnglishGreeter>,
}

impl Application {
    fn run(&self) {
        self.greeter.greet();
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // ContainerBuilder collects all types registered with derive macros
    let mut container = ContainerBuilder::new()
        .expect("error initializing ContainerBuilder")
        .build();

    let application = container
        .instance_typed::<Application>()
        .expect("error creating Application");

    // prints "Hello world!"
    application.run();
}
