use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::deps::{DepMap, Key};
use crate::effect::{Effect, EffectOptions};
use crate::queue::Scheduler;
use crate::ChangeKind;

/// A lazily memoized derived value. The getter runs only when a dependency
/// changed since the last read; invalidation merely flips a dirty flag and
/// notifies readers of the cached value.
pub struct Computed<T> {
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T> {
	fn clone(&self) -> Self {
		Computed {
			body: self.body.clone(),
		}
	}
}

struct ComputedBody<T> {
	runner: Effect<T>,
	value: RefCell<Option<T>>,
	dirty: Cell<bool>,
	deps: DepMap,
}

impl<T> Computed<T>
where
	T: 'static,
{
	pub fn new(getter: impl Fn() -> T + 'static) -> Self {
		let body = Rc::new_cyclic(|this: &Weak<ComputedBody<T>>| {
			// Invalidation does not recompute: it marks the cache stale and
			// notifies whoever read the cached value.
			let this = this.clone();
			let scheduler = Scheduler::Custom(Rc::new(move |_job| {
				if let Some(body) = this.upgrade() {
					body.dirty.set(true);
					body.deps.trigger(&Key::Value, ChangeKind::Set);
				}
			}));
			ComputedBody {
				runner: Effect::with(
					getter,
					EffectOptions {
						lazy: true,
						scheduler: Some(scheduler),
					},
				),
				value: RefCell::new(None),
				dirty: Cell::new(true),
				deps: DepMap::new(),
			}
		});
		Computed { body }
	}

	/// Recomputes if stale, then returns the cached value. The read is also
	/// tracked against the computed's own bucket: the recomputation happens
	/// in a nested run, so without this the outer subscriber would lose its
	/// edge to the computed.
	pub fn get(&self) -> Ref<'_, T> {
		if self.body.dirty.get() {
			let value = self.body.runner.run();
			*self.body.value.borrow_mut() = Some(value);
			self.body.dirty.set(false);
		}
		self.body.deps.track(&Key::Value);
		Ref::map(self.body.value.borrow(), |value| value.as_ref().unwrap())
	}

	pub fn get_cloned(&self) -> T
	where
		T: Clone,
	{
		self.get().clone()
	}

	/// Computed values are derived; writes are reported and dropped.
	pub fn set(&self, _value: T) {
		tracing::warn!("set on a computed value was ignored");
	}
}
