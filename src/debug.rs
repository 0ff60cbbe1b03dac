use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Prints to stdout only when `--debug` was given.
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_verbose() {
            println!("[debug] {}", format_args!($($arg)*));
        }
    };
}

/// Prints to stderr only when `--debug` was given.
#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_verbose() {
            eprintln!("[debug] {}", format_args!($($arg)*));
        }
    };
}
