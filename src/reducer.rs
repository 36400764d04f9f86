//! Numeric reducers - stateful fold of an input stream into incremental outputs.
//!
//! A reducer consumes one validated input at a time and emits an output
//! only when the aggregate changes. State lives for one call and is
//! discarded afterwards. Reducers never touch the channel or the
//! cancellation scope; the surrounding drivers do that.
//!
//! Domain validation is not the reducer's job either - inputs reaching
//! [`Reducer::feed`] have already passed the non-negative check at the
//! protocol boundary.

/// A stateful fold over a sequence of numeric inputs.
pub trait Reducer {
    /// Consume the next input; returns the new aggregate if it changed.
    fn feed(&mut self, input: i64) -> Option<i64>;

    /// The current aggregate, `None` before any input changed it.
    fn current(&self) -> Option<i64>;
}

/// Running maximum: emits only when a new strict maximum appears.
///
/// An empty input sequence yields no maximum at all - `current()` stays
/// `None`, which is distinct from an aggregate of zero.
#[derive(Debug, Default)]
pub struct RunningMax {
    max: Option<i64>,
}

impl RunningMax {
    /// Create a reducer with no maximum yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reducer for RunningMax {
    fn feed(&mut self, input: i64) -> Option<i64> {
        match self.max {
            Some(max) if input <= max => None,
            _ => {
                self.max = Some(input);
                self.max
            }
        }
    }

    fn current(&self) -> Option<i64> {
        self.max
    }
}
