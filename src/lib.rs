//! Eventual values: readers block until a value is set, optionally with an expiration, a
//! fallback default and atomic get-or-populate.
//!
//! ```
//! use eventual::{dont_wait, Context, Eventual};
//!
//! let value = Eventual::<i32>::new();
//! assert!(value.get(dont_wait()).is_err());
//!
//! let writer = value.clone();
//! std::thread::spawn(move || writer.set(42));
//! assert_eq!(value.get(&Context::background()), Ok(42));
//! ```

mod config;
mod context;
mod eventual;
mod map;
mod state;
mod waiter;

#[cfg(feature = "async")]
mod r#async;

pub mod error;

pub use config::{CellConfig, Timeout};
pub use context::{dont_wait, Context};
pub use eventual::Eventual;
pub use map::EventualMap;
