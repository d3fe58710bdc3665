use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use crate::deps::{DepMap, Key};
use crate::value::Value;
use crate::ChangeKind;

/// An observable object: a string-keyed map of [`Value`]s whose reads are
/// tracked and whose writes trigger. Clones are views over the same target,
/// so a readonly view and the object it was derived from share one bucket.
#[derive(Clone)]
pub struct Obj {
	body: Rc<ObjBody>,
	shallow: bool,
	readonly: bool,
}

struct ObjBody {
	entries: RefCell<BTreeMap<Rc<str>, Value>>,
	deps: DepMap,
}

/// Deep mutable view of `obj`'s target.
pub fn reactive(obj: &Obj) -> Obj {
	obj.flavored(false, false)
}

/// Mutable view that hands nested objects back unwrapped.
pub fn shallow_reactive(obj: &Obj) -> Obj {
	obj.flavored(true, false)
}

/// View that absorbs writes and skips tracking; nested objects are readonly
/// as well.
pub fn readonly(obj: &Obj) -> Obj {
	obj.flavored(false, true)
}

/// Readonly at the top level only; nested objects come back mutable.
pub fn shallow_readonly(obj: &Obj) -> Obj {
	obj.flavored(true, true)
}

impl Obj {
	pub fn new() -> Self {
		Obj {
			body: Rc::new(ObjBody {
				entries: RefCell::new(BTreeMap::new()),
				deps: DepMap::new(),
			}),
			shallow: false,
			readonly: false,
		}
	}

	fn flavored(&self, shallow: bool, readonly: bool) -> Obj {
		Obj {
			body: self.body.clone(),
			shallow,
			readonly,
		}
	}

	/// Whether two handles observe the same target.
	pub fn ptr_eq(&self, other: &Obj) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub(crate) fn addr(&self) -> *const () {
		Rc::as_ptr(&self.body) as *const ()
	}

	pub fn is_readonly(&self) -> bool {
		self.readonly
	}

	pub fn is_shallow(&self) -> bool {
		self.shallow
	}

	/// Reads `key`, registering the active subscriber as a dependent of it.
	/// Absent keys are still tracked, so an effect that looked for a missing
	/// key re-runs once the key is added. Nested objects are re-wrapped with
	/// this view's readonly flag unless the view is shallow.
	pub fn get(&self, key: &str) -> Option<Value> {
		if !self.readonly {
			self.body.deps.track(&Key::Prop(Rc::from(key)));
		}
		let value = self.body.entries.borrow().get(key).cloned();
		match value {
			Some(Value::Obj(child)) if !self.shallow => {
				Some(Value::Obj(child.flavored(false, self.readonly)))
			}
			other => other,
		}
	}

	/// Writes `key`, triggering dependents when the value actually changed.
	/// A write through a readonly view is reported and absorbed, never an
	/// error: the interception contract is that writes do not fail.
	pub fn set(&self, key: &str, value: impl Into<Value>) {
		if self.readonly {
			tracing::warn!(key, "set through a readonly view was ignored");
			return;
		}
		let key: Rc<str> = Rc::from(key);
		let value = base_flavor(value.into());
		let (kind, changed) = {
			let mut entries = self.body.entries.borrow_mut();
			let kind = if entries.contains_key(&*key) {
				ChangeKind::Set
			} else {
				ChangeKind::Add
			};
			let old = entries.insert(key.clone(), value.clone());
			let changed = match &old {
				Some(old) => !old.same(&value),
				None => true,
			};
			(kind, changed)
		};
		if changed {
			self.body.deps.trigger(&Key::Prop(key), kind);
		}
	}

	/// Membership test; a read of `key` like any other.
	pub fn contains(&self, key: &str) -> bool {
		if !self.readonly {
			self.body.deps.track(&Key::Prop(Rc::from(key)));
		}
		self.body.entries.borrow().contains_key(key)
	}

	/// Key enumeration; a read of the key set, re-triggered by additions and
	/// removals but not by overwrites.
	pub fn keys(&self) -> Vec<Rc<str>> {
		if !self.readonly {
			self.body.deps.track(&Key::Iterate);
		}
		self.body.entries.borrow().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		if !self.readonly {
			self.body.deps.track(&Key::Iterate);
		}
		self.body.entries.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Removes `key` if present, triggering its dependents and the key-set
	/// dependents. Readonly views absorb the removal.
	pub fn remove(&self, key: &str) -> Option<Value> {
		if self.readonly {
			tracing::warn!(key, "remove through a readonly view was ignored");
			return None;
		}
		let removed = self.body.entries.borrow_mut().remove(key);
		if removed.is_some() {
			self.body.deps.trigger(&Key::Prop(Rc::from(key)), ChangeKind::Delete);
		}
		removed
	}

	/// Low-level read registration against this object's bucket.
	pub fn track(&self, key: &Key) {
		self.body.deps.track(key)
	}

	/// Low-level change notification against this object's bucket.
	pub fn trigger(&self, key: &Key, kind: ChangeKind) {
		self.body.deps.trigger(key, kind)
	}
}

impl Default for Obj {
	fn default() -> Self {
		Obj::new()
	}
}

// Stored object values are kept in the base flavor; views re-apply their own
// flags on the way out.
fn base_flavor(value: Value) -> Value {
	match value {
		Value::Obj(obj) => Value::Obj(obj.flavored(false, false)),
		other => other,
	}
}

impl Debug for Obj {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.body.entries.borrow();
		f.debug_map().entries(entries.iter()).finish()
	}
}
