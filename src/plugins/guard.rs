//! Panic containment for plugin code
//!
//! A process-wide panic hook records where a guarded call panicked, with a
//! backtrace taken at the panic site. Panics outside a guarded call go to the
//! previously installed hook unchanged.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if !GUARDED.with(Cell::get) {
            return previous(info);
        }
        let report = PanicReport {
            message: panic_message(info.payload()),
            location: info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown location".to_string()),
            backtrace: Backtrace::force_capture(),
        };
        LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
    }));
});

/// A contained panic: its message, where it was raised, and the stack at that point
#[derive(Debug)]
pub struct PanicReport {
    pub message: String,
    pub location: String,
    pub backtrace: Backtrace,
}

impl fmt::Display for PanicReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

/// Run `f`, turning a panic into a [`PanicReport`]
pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R, PanicReport> {
    Lazy::force(&HOOK);

    let outer = GUARDED.with(|g| g.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    GUARDED.with(|g| g.set(outer));

    result.map_err(|payload| {
        LAST_PANIC
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| PanicReport {
                message: panic_message(payload.as_ref()),
                location: "unknown location".to_string(),
                backtrace: Backtrace::disabled(),
            })
    })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
