/*!
This crate defines the [`Metric`](trait.Metric.html) and [`StreamingMetric`](trait.StreamingMetric.html) traits and the concrete binary classification metrics built on them: cross entropy, ROC and precision-recall curves with their AUCs, and per-threshold confusion metrics.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod binary_cross_entropy;
mod mean;
mod precision_recall;
mod roc;
mod threshold;

pub use self::binary_cross_entropy::{BinaryCrossEntropy, BinaryCrossEntropyInput};
pub use self::mean::{Mean, MeanVariance};
pub use self::precision_recall::{
	auc_precision_recall, compute_precision_recall_curve, PrecisionRecallCurvePoint,
};
pub use self::roc::{auc_roc, compute_roc_curve, RocCurvePoint};
pub use self::threshold::{compute_threshold_metrics, compute_threshold_metrics_curve, ThresholdMetrics};

/**
The `Metric` trait defines a common interface to metrics that can be computed when the entire input is available at once.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope. When Rust stabilizes Generic Associated Types (GATs), the generic lifetime will move to the associated types.
*/
pub trait Metric<'a> {
	type Input;
	type Output;
	fn compute(input: Self::Input) -> Self::Output;
}

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available in chunks, such as mean and cross entropy.

After being initialized, a value of type `T` implementing the `StreamingMetric` trait can have `update()` called on it with values of the associated type `Input`. Multiple values of `T` can be merged together by calling `merge()`. When finished aggregating, call `finalize()` on the metric to produce the associated type `Output`.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope. When Rust stabilizes Generic Associated Types (GATs), the generic lifetime will move to the associated types.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}
