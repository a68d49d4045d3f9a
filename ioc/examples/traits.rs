use std::sync::Arc;
use trellis_config::Format;
use trellis_ioc::{global, resolve, Experiment};

// 1. Define the abstraction (the trait)
trait Metric: Send + Sync {
  fn name(&self) -> &str;
  fn score(&self, predictions: &[u8], labels: &[u8]) -> f64;
}

// 2. Define a concrete implementation
struct Accuracy;
impl Metric for Accuracy {
  fn name(&self) -> &str {
    "accuracy"
  }

  fn score(&self, predictions: &[u8], labels: &[u8]) -> f64 {
    let hits = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    hits as f64 / labels.len() as f64
  }
}

// 3. Define a component that depends on the abstraction
struct Evaluator {
  metric: Arc<dyn Metric>,
}

impl Evaluator {
  fn evaluate(&self) {
    let score = self.metric.score(&[1, 0, 2, 2], &[1, 0, 2, 1]);
    println!("[EVAL] {} = {:.2}", self.metric.name(), score);
  }
}

fn main() {
  // --- Registration ---

  // Accuracy is registered as a `dyn Metric` plugin: it is built as Arc<Accuracy> and
  // handed out as Arc<dyn Metric>.
  global()
    .register_trait::<dyn Metric, _>("Accuracy", |_| Ok(Arc::new(Accuracy) as Arc<dyn Metric>))
    .unwrap();

  // The evaluator does not create its metric; the document wires it in.
  global()
    .register("Evaluator", |args| {
      Ok(Evaluator {
        metric: args.object::<dyn Metric>("metric")?,
      })
    })
    .unwrap();

  // --- Building and Usage ---
  let experiment = Experiment::builder()
    .parse(
      "metric: {_name: Accuracy}\nevaluator: {_name: Evaluator, metric: $metric}\n",
      Format::Yaml,
    )
    .unwrap();

  println!("Resolving the evaluator...");
  let evaluator = resolve!(experiment, Evaluator, "evaluator");
  evaluator.evaluate();

  // The evaluator received the very metric built under `metric`.
  let metric = resolve!(experiment, trait Metric, "metric");
  assert!(Arc::ptr_eq(&evaluator.metric, &metric));
}
