use std::fmt;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::*;

use crate::*;

/// Snapshot handed to a [`ProgressListener`] each time a node is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  /// Number of expansions so far, including this one.
  pub iteration: u64,
  /// Priority of the node being expanded.
  pub estimated_cost: Cost,
  pub trips: Cost,
  pub segment: Segment,
  pub frontier: usize,
  /// Tonnage hauled so far in the node being expanded.
  pub covered: u64,
}

impl fmt::Display for Progress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Iteration: {}  Estimated Cost: {}  Actual Cost: {}  Segment: {}  Progress: {} tons",
           self.iteration, self.estimated_cost, self.trips, self.segment, self.covered)
  }
}

/// Observes the search. Returning `ControlFlow::Break` stops it; the search then reports
/// [`Outcome::Aborted`](crate::Outcome::Aborted).
pub trait ProgressListener {
  fn on_expand(&mut self, progress: &Progress) -> ControlFlow<()>;
}

impl<F> ProgressListener for F
  where
    F: FnMut(&Progress) -> ControlFlow<()>
{
  fn on_expand(&mut self, progress: &Progress) -> ControlFlow<()> {
    self(progress)
  }
}

/// Never interrupts and reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressListener for Silent {
  #[inline]
  fn on_expand(&mut self, _: &Progress) -> ControlFlow<()> {
    ControlFlow::Continue(())
  }
}

/// Stops the search after a number of expansions or a wall-clock limit, and optionally logs
/// every n-th expansion.
#[derive(Debug, Clone, Default)]
pub struct Budget {
  max_iterations: Option<u64>,
  time_limit: Option<Duration>,
  log_every: Option<u64>,
  started: Option<Instant>,
}

impl Budget {
  pub fn new() -> Self {
    Budget::default()
  }

  pub fn max_iterations(mut self, n: u64) -> Self {
    self.max_iterations = Some(n);
    self
  }

  /// Measured from the first expansion.
  pub fn time_limit(mut self, limit: Duration) -> Self {
    self.time_limit = Some(limit);
    self
  }

  pub fn log_every(mut self, n: u64) -> Self {
    self.log_every = Some(n).filter(|&n| n > 0);
    self
  }
}

impl ProgressListener for Budget {
  fn on_expand(&mut self, progress: &Progress) -> ControlFlow<()> {
    let started = *self.started.get_or_insert_with(Instant::now);

    if let Some(n) = self.log_every {
      if progress.iteration % n == 0 {
        info!(frontier=progress.frontier, "{}", progress);
      }
    }

    if let Some(max) = self.max_iterations {
      if progress.iteration > max {
        info!(max_iterations=max, "iteration limit reached");
        return ControlFlow::Break(());
      }
    }
    if let Some(limit) = self.time_limit {
      if started.elapsed() >= limit {
        info!(time_limit=?limit, iteration=progress.iteration, "time limit reached");
        return ControlFlow::Break(());
      }
    }
    ControlFlow::Continue(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn progress(iteration: u64) -> Progress {
    Progress { iteration, estimated_cost: 12, trips: 10, segment: 3, frontier: 4, covered: 300 }
  }

  #[test]
  fn display_line() {
    assert_eq!(
      progress(7).to_string(),
      "Iteration: 7  Estimated Cost: 12  Actual Cost: 10  Segment: 3  Progress: 300 tons"
    );
  }

  #[test]
  fn iteration_budget() {
    let mut budget = Budget::new().max_iterations(2).log_every(1);
    assert_eq!(budget.on_expand(&progress(1)), ControlFlow::Continue(()));
    assert_eq!(budget.on_expand(&progress(2)), ControlFlow::Continue(()));
    assert_eq!(budget.on_expand(&progress(3)), ControlFlow::Break(()));
  }

  #[test]
  fn zero_time_limit_stops_immediately() {
    let mut budget = Budget::new().time_limit(Duration::from_secs(0));
    assert_eq!(budget.on_expand(&progress(1)), ControlFlow::Break(()));
  }

  #[test]
  fn unlimited() {
    let mut budget = Budget::new();
    assert!((1..1000).all(|i| budget.on_expand(&progress(i)) == ControlFlow::Continue(())));
    assert_eq!(Silent.on_expand(&progress(1)), ControlFlow::Continue(()));
  }
}
