//! Poll cursors.

use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// An opaque, monotonically advancing poll position.
///
/// A fetch may return an unset cursor to mean "do not advance", which keeps
/// the previous position for the next poll.
pub trait Cursor: Clone + Debug + Send {
    /// Whether this is the zero value.
    fn is_unset(&self) -> bool;
}

impl Cursor for DateTime<Utc> {
    fn is_unset(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH
    }
}

impl Cursor for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl Cursor for u64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

impl Cursor for i64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}
