use std::cell::RefCell;

const TAG_CAPACITY: usize = 100;

/// Reusable buffers for one formatting pass.
#[derive(Debug)]
pub(crate) struct Scratch {
    pub(crate) tag: String,
}

impl Scratch {
    fn new() -> Self {
        Self {
            tag: String::with_capacity(TAG_CAPACITY),
        }
    }

    fn reset(&mut self) {
        self.tag.clear();
    }
}

thread_local! {
    static SCRATCH: RefCell<Scratch> = RefCell::new(Scratch::new());
}

/// Runs `f` with this thread's scratch buffers.
///
/// A nested call on the same thread (a reporter that renders, say) gets a
/// fresh temporary instead of the busy thread-local one.
pub(crate) fn with_scratch<R>(f: impl FnOnce(&mut Scratch) -> R) -> R {
    SCRATCH.with(|cell| match cell.try_borrow_mut() {
        Ok(mut scratch) => {
            scratch.reset();
            f(&mut scratch)
        }
        Err(_) => f(&mut Scratch::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_is_reset_between_uses() {
        with_scratch(|scratch| scratch.tag.push_str("f12"));
        with_scratch(|scratch| assert!(scratch.tag.is_empty()));
    }

    #[test]
    fn nested_use_gets_separate_buffer() {
        with_scratch(|outer| {
            outer.tag.push_str("outer");
            with_scratch(|inner| {
                assert!(inner.tag.is_empty());
                inner.tag.push_str("inner");
            });
            assert_eq!(outer.tag, "outer");
        });
    }

    #[test]
    fn threads_own_their_scratch() {
        with_scratch(|scratch| scratch.tag.push_str("main"));
        std::thread::spawn(|| with_scratch(|scratch| assert!(scratch.tag.is_empty())))
            .join()
            .expect("scratch thread");
    }
}
