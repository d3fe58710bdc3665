pub mod macros;
pub mod microtask;

mod addr;
mod computed;
mod deps;
mod effect;
mod obj;
mod queue;
mod stack;
mod value;
mod watch;

use std::rc::Rc;

pub use computed::Computed;
pub use deps::{DepMap, DepSet, Key};
pub use effect::{Effect, EffectOptions};
pub use obj::{reactive, readonly, shallow_reactive, shallow_readonly, Obj};
pub use queue::{Job, JobQueue, Scheduler};
pub use value::Value;
pub use watch::{watch, OnInvalidate, StaleToken, WatchHandle, WatchOptions, WatchSource};

/// Classification of a mutation handed to [`DepMap::trigger`]. Structural
/// changes (`Add`, `Delete`) additionally notify key-set subscribers; a
/// same-key overwrite does not.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChangeKind {
	Set,
	Add,
	Delete,
}

pub(crate) trait Subscriber: 'static {
	/// Re-run the wrapped computation with tracking, discarding the result.
	fn run_dyn(self: Rc<Self>);

	/// The dispatch strategy trigger uses instead of a direct run.
	fn scheduler(&self) -> Option<Scheduler>;

	/// Record a dependency set this subscriber was just added to.
	fn remember(&self, dep: DepSet);
}
