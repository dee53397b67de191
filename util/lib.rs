/*!
Small utilities shared across the workspace: the [`Finite`](finite::Finite) newtype used to totally order losses, and the [`ProgressCounter`](progress_counter::ProgressCounter) handed to progress callbacks.
*/

pub mod finite;
pub mod progress_counter;
