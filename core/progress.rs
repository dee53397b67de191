use boosttune_util::progress_counter::ProgressCounter;

/// Progress events delivered through the `update_progress` callback.
#[derive(Clone, Debug)]
pub enum Progress {
	Loading,
	/// The counter advances by one after each completed trial.
	Tuning(ProgressCounter),
	Training,
	Evaluating,
	Writing,
}
