#[cfg(target_arch = "wasm32")]
mod imp {
	use wasm_bindgen::prelude::*;

	#[wasm_bindgen]
	extern "C" {
		#[wasm_bindgen(js_name = queueMicrotask)]
		fn queue_microtask(closure: &JsValue);
	}

	pub fn queue<F: FnOnce() + 'static>(func: F) {
		queue_microtask(&Closure::once_into_js(func));
	}
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
	use std::cell::RefCell;
	use std::collections::VecDeque;

	thread_local! {
		static TASKS: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
	}

	pub fn queue<F: FnOnce() + 'static>(func: F) {
		TASKS.with(|tasks| tasks.borrow_mut().push_back(Box::new(func)));
	}

	/// Drains queued tasks, including ones queued while draining. The host
	/// calls this at the end of a synchronous turn; tests use it to make the
	/// turn boundary explicit.
	pub fn run() {
		loop {
			let task = TASKS.with(|tasks| tasks.borrow_mut().pop_front());
			match task {
				Some(task) => task(),
				None => break,
			}
		}
	}
}

pub use imp::queue;
#[cfg(not(target_arch = "wasm32"))]
pub use imp::run;
