use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::addr::WeakAddr;
use crate::queue::Job;
use crate::stack;
use crate::{ChangeKind, Subscriber};

/// Dependency key of an observed object: a named property, the synthetic
/// key-set key touched by enumeration, or a computed's cached value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Key {
	Prop(Rc<str>),
	Iterate,
	Value,
}

/// The subscribers interested in exactly one (object, key) pair. Shared
/// between the bucket and the dependency lists of its members, so a
/// subscriber can leave every set it joined without consulting the bucket.
#[derive(Clone, Default)]
pub struct DepSet {
	subs: Rc<RefCell<Vec<WeakAddr<dyn Subscriber>>>>,
}

impl DepSet {
	fn add(&self, sub: WeakAddr<dyn Subscriber>) {
		let mut subs = self.subs.borrow_mut();
		if !subs.contains(&sub) {
			subs.push(sub);
		}
	}

	pub(crate) fn remove(&self, addr: *const ()) {
		self.subs.borrow_mut().retain(|sub| sub.addr() != addr);
	}

	fn snapshot(&self, into: &mut SmallVec<[Rc<dyn Subscriber>; 8]>) {
		for sub in self.subs.borrow().iter() {
			if into
				.iter()
				.any(|seen| Rc::as_ptr(seen) as *const () == sub.addr())
			{
				continue;
			}
			if let Some(sub) = sub.upgrade() {
				into.push(sub);
			}
		}
	}
}

/// One observed object's bucket: key to dependency set. Owned by the object
/// it describes, so the association dies together with the object.
#[derive(Default)]
pub struct DepMap {
	map: RefCell<FxHashMap<Key, DepSet>>,
}

impl DepMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the active subscriber, if any, as a dependent of `key`.
	pub fn track(&self, key: &Key) {
		let active = match stack::active() {
			Some(active) => active,
			None => return,
		};
		let dep = self
			.map
			.borrow_mut()
			.entry(key.clone())
			.or_default()
			.clone();
		dep.add(WeakAddr::new(active.clone()));
		if let Some(sub) = active.upgrade() {
			sub.remember(dep);
		}
	}

	/// Notifies every subscriber of `key`; structural changes also notify
	/// key-set subscribers. The sets are snapshotted before any subscriber
	/// runs: a re-run removes itself and re-tracks, and iterating the live
	/// set while that happens would revisit or skip members.
	pub fn trigger(&self, key: &Key, kind: ChangeKind) {
		let mut run: SmallVec<[Rc<dyn Subscriber>; 8]> = SmallVec::new();
		{
			let map = self.map.borrow();
			if let Some(dep) = map.get(key) {
				dep.snapshot(&mut run);
			}
			if kind != ChangeKind::Set {
				if let Some(dep) = map.get(&Key::Iterate) {
					dep.snapshot(&mut run);
				}
			}
		}

		if run.is_empty() {
			return;
		}
		tracing::trace!(?key, ?kind, subscribers = run.len(), "trigger");

		// An effect that writes a key it also reads must not re-enter itself.
		let active = stack::active_addr();
		for sub in run {
			if active == Some(Rc::as_ptr(&sub) as *const ()) {
				continue;
			}
			match sub.scheduler() {
				Some(scheduler) => scheduler.dispatch(Job::new(sub)),
				None => sub.run_dyn(),
			}
		}
	}
}
