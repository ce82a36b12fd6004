/// Writes a trace line when the caller's `Config::DEBUG` is set, either to the
/// given `Option<RefCell<impl fmt::Write>>` sink or to stderr.
#[macro_export]
macro_rules! debug {
    ($writer:expr, $($arg:tt)+) => {
        if Config::DEBUG {
            match $writer {
                Some(ref w) => {
                    use std::fmt::Write as _;
                    let _ = writeln!(w.borrow_mut(), $($arg)+);
                }
                None => {
                    eprintln!($($arg)+);
                }
            }
        }
    };
}

pub mod avl_tree;
pub mod bst;
pub mod config;
pub mod equal_paths;
pub mod error;
pub mod node;
pub mod pool;
pub mod slot;
pub mod trace;

pub use avl_tree::{AvlTree, DebugAvlTree};
pub use error::{Error, InvariantViolation};
pub use node::{NodeId, Side};
