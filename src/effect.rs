use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::deps::DepSet;
use crate::queue::Scheduler;
use crate::stack;
use crate::Subscriber;

#[derive(Default, Clone)]
pub struct EffectOptions {
	/// Skip the initial run; the caller invokes [`Effect::run`] on demand.
	pub lazy: bool,
	/// Dispatch strategy used by trigger instead of a direct synchronous run.
	pub scheduler: Option<Scheduler>,
}

/// A function registered as a subscriber. Re-runs whenever a dependency
/// recorded during its previous run changes. Dropping the last handle
/// detaches the subscriber from every dependency set.
pub struct Effect<T> {
	body: Rc<EffectBody<T>>,
}

impl<T> Clone for Effect<T> {
	fn clone(&self) -> Self {
		Effect {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct EffectBody<T> {
	func: Box<dyn Fn() -> T>,
	scheduler: Option<Scheduler>,
	deps: RefCell<SmallVec<[DepSet; 4]>>,
}

impl<T> Effect<T>
where
	T: 'static,
{
	pub fn new(func: impl Fn() -> T + 'static) -> Self {
		Self::with(func, EffectOptions::default())
	}

	pub fn with(func: impl Fn() -> T + 'static, options: EffectOptions) -> Self {
		let effect = Effect {
			body: Rc::new(EffectBody {
				func: Box::new(func),
				scheduler: options.scheduler,
				deps: RefCell::new(SmallVec::new()),
			}),
		};
		if !options.lazy {
			effect.run();
		}
		effect
	}

	/// Runs the wrapped function with tracking enabled and returns its
	/// result. Dependencies recorded by the previous run are dropped first,
	/// so a conditional read that disappeared stops re-triggering this
	/// effect.
	pub fn run(&self) -> T {
		EffectBody::run(&self.body)
	}

	pub(crate) fn downgrade(&self) -> Weak<EffectBody<T>> {
		Rc::downgrade(&self.body)
	}

	pub(crate) fn into_subscriber(self) -> Rc<dyn Subscriber> {
		self.body
	}
}

impl<T> EffectBody<T>
where
	T: 'static,
{
	pub(crate) fn run(this: &Rc<Self>) -> T {
		this.cleanup();
		let _frame = stack::enter(Rc::downgrade(this) as Weak<dyn Subscriber>);
		(this.func)()
	}

	fn cleanup(&self) {
		let addr = self as *const Self as *const ();
		let mut deps = self.deps.borrow_mut();
		for dep in deps.iter() {
			dep.remove(addr);
		}
		deps.clear();
	}
}

impl<T> Drop for EffectBody<T> {
	fn drop(&mut self) {
		let addr = self as *const Self as *const ();
		for dep in self.deps.get_mut().iter() {
			dep.remove(addr);
		}
	}
}

impl<T> Subscriber for EffectBody<T>
where
	T: 'static,
{
	fn run_dyn(self: Rc<Self>) {
		let _ = EffectBody::run(&self);
	}

	fn scheduler(&self) -> Option<Scheduler> {
		self.scheduler.clone()
	}

	fn remember(&self, dep: DepSet) {
		// Duplicates across repeated reads in one run are fine; cleanup
		// removes by set identity, not by count.
		self.deps.borrow_mut().push(dep);
	}
}
