use std::cell::RefCell;
use std::rc::Weak;

use crate::Subscriber;

// The currently-running subscriber is the top of a stack, so that an effect
// created while another is executing does not steal tracking from the outer
// one after it returns.
thread_local! {
	static STACK: RefCell<Vec<Weak<dyn Subscriber>>> = RefCell::new(Vec::new());
}

pub(crate) fn active() -> Option<Weak<dyn Subscriber>> {
	STACK.with(|stack| stack.borrow().last().cloned())
}

pub(crate) fn active_addr() -> Option<*const ()> {
	STACK.with(|stack| {
		stack
			.borrow()
			.last()
			.map(|sub| Weak::as_ptr(sub) as *const ())
	})
}

pub(crate) fn enter(sub: Weak<dyn Subscriber>) -> Frame {
	STACK.with(|stack| stack.borrow_mut().push(sub));
	Frame { _priv: () }
}

/// Restores the previous active subscriber when dropped, even on unwind.
pub(crate) struct Frame {
	_priv: (),
}

impl Drop for Frame {
	fn drop(&mut self) {
		STACK.with(|stack| {
			stack.borrow_mut().pop();
		});
	}
}
