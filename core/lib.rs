/*!
This crate ties the workspace together: it loads a tuning configuration, drives one of the three hyperparameter optimization strategies over stratified cross-validation, trains a final model on the best configuration found, and writes the trial history, summary, model, and evaluation charts to the output directory.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod config;
pub mod cv;
pub mod progress;
pub mod random_search;
pub mod report;
pub mod space;
pub mod study;
pub mod tpe_search;
pub mod trial;
pub mod tune;

pub use self::config::Config;
pub use self::progress::Progress;
pub use self::tune::{tune, StrategyOutcome, TuneReport};
