//! Public macros for ergonomic object resolution.

/// Resolves an object from an [`Experiment`](crate::Experiment) by key or dotted path.
///
/// This macro is the short way to pull components out of a built experiment. It panics
/// if nothing of the requested type sits at that path. For a non-panicking version,
/// use [`maybe_resolve!`] or `experiment.object::<T>(path)` directly.
///
/// # Panics
///
/// This macro will panic if the object cannot be resolved.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trellis_config::Format;
/// use trellis_ioc::{resolve, Experiment, Registry};
///
/// struct Accuracy;
///
/// trait Metric: Send + Sync { fn name(&self) -> &'static str; }
/// impl Metric for Accuracy { fn name(&self) -> &'static str { "accuracy" } }
///
/// let registry = Arc::new(Registry::new());
/// registry.register("Accuracy", |_| Ok(Accuracy)).unwrap();
/// registry
///   .register_trait::<dyn Metric, _>("Metric", |_| Ok(Arc::new(Accuracy) as Arc<dyn Metric>))
///   .unwrap();
///
/// let experiment = Experiment::builder()
///   .registry(registry)
///   .parse("concrete: {_name: Accuracy}\nboxed: {_name: Metric}\n", Format::Yaml)
///   .unwrap();
///
/// let _accuracy: Arc<Accuracy> = resolve!(experiment, Accuracy, "concrete");
/// let metric = resolve!(experiment, trait Metric, "boxed");
/// assert_eq!(metric.name(), "accuracy");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(experiment, trait MyTrait, "key")
    ($experiment:expr, trait $trait_ident:ident, $path:expr) => {
        $experiment
            .object::<dyn $trait_ident>($path)
            .unwrap_or_else(|| {
                panic!(
                    "Failed to resolve required trait object at '{}': {}",
                    $path,
                    std::any::type_name::<dyn $trait_ident>()
                )
            })
    };

    // Arm for resolving a concrete type: resolve!(experiment, MyType, "key")
    ($experiment:expr, $type:ty, $path:expr) => {
        $experiment
            .object::<$type>($path)
            .unwrap_or_else(|| {
                panic!(
                    "Failed to resolve required object at '{}': {}",
                    $path,
                    std::any::type_name::<$type>()
                )
            })
    };
}

/// Like [`resolve!`], but evaluates to an `Option` instead of panicking.
#[macro_export]
macro_rules! maybe_resolve {
    ($experiment:expr, trait $trait_ident:ident, $path:expr) => {
        $experiment.object::<dyn $trait_ident>($path)
    };

    ($experiment:expr, $type:ty, $path:expr) => {
        $experiment.object::<$type>($path)
    };
}
