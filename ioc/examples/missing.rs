use std::panic;
use trellis_config::Format;
use trellis_ioc::{maybe_resolve, resolve, Experiment};

struct UnregisteredComponent;

fn main() {
  let experiment = Experiment::builder()
    .parse("seed: 1729\n", Format::Yaml)
    .unwrap();

  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve a component the document never declared...");

  // `Experiment` holds type-erased objects, so it is not `RefUnwindSafe` on its own.
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _component = resolve!(experiment, UnregisteredComponent, "trainer");
  }));

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");

  // --- Using the non-panicking `maybe_resolve!` macro ---
  println!("\nNow, attempting to resolve using `maybe_resolve!`...");

  match maybe_resolve!(experiment, UnregisteredComponent, "trainer") {
    Some(_) => panic!("Should not have found the component!"),
    None => println!("Correctly received `None` for the missing component."),
  }

  // --- Building a document that names an unknown plugin ---
  println!("\nNow, building a document whose component has no plugin...");

  match Experiment::builder().parse("trainer: {_name: Unregistered}\n", Format::Yaml) {
    Ok(_) => panic!("Should not have built the experiment!"),
    Err(err) => println!("Correctly failed: {}", err),
  }
}
