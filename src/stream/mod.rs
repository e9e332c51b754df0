//! Stream combinators for feed subscribers

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
