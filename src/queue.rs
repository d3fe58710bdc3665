use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::microtask;
use crate::Subscriber;

/// One deferred subscriber re-run. Identity is the subscriber allocation,
/// so queueing the same subscriber twice within a turn is a no-op.
#[derive(Clone)]
pub struct Job {
	sub: Rc<dyn Subscriber>,
}

impl Job {
	pub(crate) fn new(sub: Rc<dyn Subscriber>) -> Self {
		Job { sub }
	}

	pub fn run(&self) {
		self.sub.clone().run_dyn();
	}

	fn addr(&self) -> *const () {
		Rc::as_ptr(&self.sub) as *const ()
	}
}

/// How a triggered subscriber is dispatched when it is not run directly.
#[derive(Clone)]
pub enum Scheduler {
	/// Coalesce through a job queue: one run per turn however many times the
	/// subscriber was triggered.
	Queue(JobQueue),
	/// Hand the job to user code.
	Custom(Rc<dyn Fn(Job)>),
}

impl Scheduler {
	pub(crate) fn dispatch(&self, job: Job) {
		match self {
			Scheduler::Queue(queue) => {
				queue.add(job);
				queue.flush();
			}
			Scheduler::Custom(func) => (**func)(job),
		}
	}
}

/// Deduplicating, turn-coalescing buffer of pending reactions.
#[derive(Clone, Default)]
pub struct JobQueue {
	inner: Rc<QueueInner>,
}

#[derive(Default)]
struct QueueInner {
	pending: RefCell<Vec<Job>>,
	flushing: Cell<bool>,
}

impl JobQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a job unless an identical one is already pending.
	pub fn add(&self, job: Job) {
		let mut pending = self.inner.pending.borrow_mut();
		if !pending.iter().any(|queued| queued.addr() == job.addr()) {
			pending.push(job);
		}
	}

	/// Schedules a drain on the next turn. Repeated calls within one turn
	/// are no-ops; the drain runs every pending job exactly once, in queue
	/// order. Jobs queued while draining start a fresh cycle.
	pub fn flush(&self) {
		if self.inner.flushing.get() {
			return;
		}
		self.inner.flushing.set(true);
		let inner = self.inner.clone();
		microtask::queue(move || {
			inner.flushing.set(false);
			let jobs = inner.pending.take();
			for job in jobs {
				job.run();
			}
		});
	}
}
