use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;

use crate::effect::{Effect, EffectBody, EffectOptions};
use crate::obj::Obj;
use crate::queue::Scheduler;
use crate::value::Value;
use crate::Subscriber;

#[derive(Default, Clone)]
pub struct WatchOptions {
	/// Run the callback once at registration time, with no previous value.
	pub immediate: bool,
}

/// Keeps a watch subscription alive; dropping it stops the callback.
pub struct WatchHandle {
	_sub: Rc<dyn Subscriber>,
}

/// Registers the invalidation hook for the current reaction cycle. Each
/// registration replaces the previous one; the hook fires right before the
/// next callback invocation.
pub struct OnInvalidate {
	slot: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl OnInvalidate {
	pub fn register(&self, hook: impl FnOnce() + 'static) {
		*self.slot.borrow_mut() = Some(Box::new(hook));
	}

	/// Registers a hook that marks the returned token stale. An asynchronous
	/// callback body checks the token before applying its result; staleness
	/// is cooperative, nothing is cancelled.
	pub fn token(&self) -> StaleToken {
		let token = StaleToken::default();
		let flag = token.clone();
		self.register(move || flag.0.set(true));
		token
	}
}

#[derive(Clone, Default)]
pub struct StaleToken(Rc<Cell<bool>>);

impl StaleToken {
	pub fn is_stale(&self) -> bool {
		self.0.get()
	}
}

/// Anything watchable: a getter closure, or a whole observable object.
pub trait WatchSource<T> {
	fn into_getter(self) -> Box<dyn Fn() -> T>;
}

impl<T, F> WatchSource<T> for F
where
	F: Fn() -> T + 'static,
{
	fn into_getter(self) -> Box<dyn Fn() -> T> {
		Box::new(self)
	}
}

impl WatchSource<Obj> for Obj {
	/// Whole-object watching reads every key of every reachable object, so
	/// any nested mutation or structural change re-triggers.
	fn into_getter(self) -> Box<dyn Fn() -> Obj> {
		Box::new(move || {
			let mut seen = FxHashSet::default();
			traverse(&self, &mut seen);
			self.clone()
		})
	}
}

// Bounded deep read: the visited set terminates reference cycles.
fn traverse(obj: &Obj, seen: &mut FxHashSet<*const ()>) {
	if !seen.insert(obj.addr()) {
		return;
	}
	for key in obj.keys() {
		if let Some(Value::Obj(child)) = obj.get(&key) {
			traverse(&child, seen);
		}
	}
}

/// Calls `callback(new, old, registrar)` every time `source`'s value is
/// invalidated. The getter is evaluated once up front to seed the old value,
/// or, with [`WatchOptions::immediate`], the callback itself runs once at
/// registration.
pub fn watch<T, S, C>(source: S, callback: C, options: WatchOptions) -> WatchHandle
where
	T: 'static,
	S: WatchSource<T>,
	C: FnMut(&T, Option<&T>, &OnInvalidate) + 'static,
{
	let getter = source.into_getter();
	let runner: Rc<RefCell<Option<Weak<EffectBody<T>>>>> = Rc::new(RefCell::new(None));
	let old: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
	let slot: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));
	let callback = Rc::new(RefCell::new(callback));

	let job = {
		let runner = runner.clone();
		let old = old.clone();
		let slot = slot.clone();
		let callback = callback.clone();
		Rc::new(move || {
			let body = match runner.borrow().as_ref().and_then(Weak::upgrade) {
				Some(body) => body,
				None => return,
			};
			let new_val = EffectBody::run(&body);
			// The hook registered by the previous callback fires before the
			// callback sees the newer value, so in-flight async work can be
			// marked stale.
			if let Some(hook) = slot.borrow_mut().take() {
				hook();
			}
			let registrar = OnInvalidate { slot: slot.clone() };
			let prev = old.borrow_mut().take();
			(&mut *callback.borrow_mut())(&new_val, prev.as_ref(), &registrar);
			*old.borrow_mut() = Some(new_val);
		})
	};

	let scheduler = Scheduler::Custom({
		let job = job.clone();
		Rc::new(move |_queued| (*job)())
	});
	let effect = Effect::with(
		getter,
		EffectOptions {
			lazy: true,
			scheduler: Some(scheduler),
		},
	);
	*runner.borrow_mut() = Some(effect.downgrade());

	if options.immediate {
		(*job)();
	} else {
		*old.borrow_mut() = Some(effect.run());
	}

	WatchHandle {
		_sub: effect.into_subscriber(),
	}
}
