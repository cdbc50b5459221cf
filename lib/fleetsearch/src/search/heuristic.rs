use tracing::*;

use crate::*;

/// Estimate of the trips still needed to reach a successful state from `state`.
///
/// `None` marks a state from which no successful state can be reached; such states are
/// dropped from the search. An estimate can never be negative; see [`Clamped`] for signed
/// estimators.
pub trait Heuristic: Sync {
  fn estimate(&self, state: &FleetState<'_>) -> Option<Cost>;
}

impl<F> Heuristic for F
  where
    F: Fn(&FleetState<'_>) -> Option<Cost> + Sync
{
  fn estimate(&self, state: &FleetState<'_>) -> Option<Cost> {
    self(state)
  }
}

/// Always zero. Turns A* into uniform-cost search.
#[derive(Debug, Clone, Copy, Default)]
pub struct Zero;

impl Heuristic for Zero {
  #[inline]
  fn estimate(&self, _: &FleetState<'_>) -> Option<Cost> { Some(0) }
}

/// Admissible bound: every unit of remaining demand needs a haul by some truck, at best the
/// largest one, and every truck away from the garage needs at least one more trip to return.
///
/// Dead ends are states where the remaining demand exceeds what the whole fleet could haul
/// in the segments left, or where a route still needing tonnage starts at a location that
/// is empty and cannot be reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerBound;

impl Heuristic for LowerBound {
  fn estimate(&self, state: &FleetState<'_>) -> Option<Cost> {
    let problem = state.problem();
    let largest = problem.largest_capacity() as u64;
    let mut hauls = 0;
    let mut remaining = 0;

    for (r, &(src, _)) in problem.routes().iter().enumerate() {
      let rem = state.remaining_demand(r) as u64;
      if rem == 0 { continue; }
      if largest == 0 { return None; }
      if state.resident_count(src) == 0 && problem.config().incoming(src).is_empty() {
        return None;
      }
      hauls += num::Integer::div_ceil(&rem, &largest);
      remaining += rem;
    }

    if remaining > problem.fleet_capacity() * state.segments_left() as u64 {
      return None;
    }
    let away = problem.num_trucks() - state.resident_count(problem.garage());
    Some(hauls + away as Cost)
  }
}

/// Remaining tonnage of each route divided by the tonnage resident at its source, summed over
/// routes. Often far tighter than [`LowerBound`] but not admissible.
///
/// A state is a dead end when a route still needing tonnage has no trucks at its source, or
/// when the estimate exceeds the trips those trucks could make in the segments left.
#[derive(Debug, Clone, Copy, Default)]
pub struct Throughput;

impl Heuristic for Throughput {
  fn estimate(&self, state: &FleetState<'_>) -> Option<Cost> {
    let problem = state.problem();
    let left = state.segments_left() as u64;
    let mut estimate = 0;
    let mut attainable = 0;

    for (r, &(src, _)) in problem.routes().iter().enumerate() {
      let rem = state.remaining_demand(r) as u64;
      if rem == 0 { continue; }
      let trucks = state.resident_count(src) as u64;
      if trucks == 0 { return None; }
      attainable += trucks * left;
      estimate += rem / state.resident_tonnage(src);
    }

    if estimate <= attainable { Some(estimate) } else { None }
  }
}

/// Adapts a signed estimator. Negative estimates are logged and treated as zero.
#[derive(Debug, Clone, Copy)]
pub struct Clamped<F>(pub F);

impl<F> Heuristic for Clamped<F>
  where
    F: Fn(&FleetState<'_>) -> Option<i64> + Sync
{
  fn estimate(&self, state: &FleetState<'_>) -> Option<Cost> {
    (self.0)(state).map(|h| {
      if h < 0 {
        warn!(estimate=h, segment=state.segment(), "negative heuristic estimate clamped to zero");
        0
      } else {
        h as Cost
      }
    })
  }
}
