use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

/// A `fmt::Write` sink that can be handed to a tree as its debug writer while
/// the caller keeps a clone to read the trace back.
#[derive(Clone, Default)]
pub struct TraceBuffer(Rc<RefCell<String>>);

impl std::fmt::Write for TraceBuffer {
    fn write_str(&mut self, s: &str) -> Result<(), std::fmt::Error> {
        self.0.borrow_mut().write_str(s)
    }
}

impl TraceBuffer {
    pub fn new() -> Self {
        TraceBuffer(Rc::new(RefCell::new(String::new())))
    }

    pub fn borrow(&self) -> std::cell::Ref<'_, String> {
        self.0.borrow()
    }

    pub fn take(&self) -> String {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}
