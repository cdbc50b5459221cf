use std::cmp::min;
use std::fmt;
use std::hash::{Hash, Hasher};
use itertools::Itertools;
use tracing::*;

use crate::{Map, Set, ConfigError};
use crate::data::mine::*;

pub mod action;
pub mod policy;

use action::Action;
use policy::{ActionGenerator, Greedy};

/// Path cost, counted in truck movements.
pub type Cost = u64;
/// Index into [`Problem::trucks`].
pub type TruckIdx = usize;
/// Index into [`Problem::routes`].
pub type RouteIdx = usize;

/// Everything that stays fixed during a search: the mine, the fleet, the demand and the
/// horizon. States borrow it rather than copying it.
#[derive(Debug, Clone)]
pub struct Problem {
  config: MineConfiguration,
  /// Sorted by capacity (largest first), then name.
  trucks: Vec<Truck>,
  /// Sorted by source then destination, i.e. by name.
  routes: Vec<(Loc, Loc)>,
  demand: Vec<Tonnage>,
  route_index: Map<(Loc, Loc), RouteIdx>,
  max_segment: Segment,
  garage: Loc,
}

impl Problem {
  #[instrument(level="debug", skip(config, trucks, demand))]
  pub fn new<D>(config: MineConfiguration, trucks: Vec<Truck>, demand: D, max_segment: Segment) -> Result<Problem, ConfigError>
    where
      D: IntoIterator<Item=((Location, Location), Tonnage)>
  {
    let garage = config.find(GARAGE).ok_or(ConfigError::MissingGarage)?;
    if max_segment == 0 {
      return Err(ConfigError::EmptyHorizon);
    }

    let mut names = Set::default();
    for t in &trucks {
      if t.tonnage_capacity == 0 {
        return Err(ConfigError::ZeroCapacity(t.name.clone()));
      }
      if !names.insert(t.name.as_str()) {
        return Err(ConfigError::DuplicateTruck(t.name.clone()));
      }
    }
    let trucks = trucks.into_iter()
      .sorted_by(|a, b| b.tonnage_capacity.cmp(&a.tonnage_capacity).then_with(|| a.name.cmp(&b.name)))
      .collect_vec();

    let resolve = |l: &Location| config.find(&l.name).ok_or_else(|| ConfigError::UnknownLocation(l.name.clone()));
    let mut route_demand = Vec::new();
    let mut seen = Set::default();
    for ((src, dst), tonnage) in demand {
      let route = (resolve(&src)?, resolve(&dst)?);
      if !config.has_edge(route.0, route.1) {
        return Err(ConfigError::MissingEdge { source: src.name, destination: dst.name });
      }
      if !seen.insert(route) {
        return Err(ConfigError::DuplicateRoute { source: src.name, destination: dst.name });
      }
      route_demand.push((route, tonnage));
    }
    route_demand.sort_unstable_by_key(|&(route, _)| route);
    let routes = route_demand.iter().map(|&(route, _)| route).collect_vec();
    let demand = route_demand.iter().map(|&(_, tonnage)| tonnage).collect_vec();
    let route_index = routes.iter().enumerate().map(|(r, &route)| (route, r)).collect();

    let garage_capacity = config.location(garage).resident_capacity as usize;
    if trucks.len() > garage_capacity {
      warn!(fleet=trucks.len(), garage_capacity, "fleet is larger than the garage");
    }
    debug!(routes=routes.len(), total_demand=demand.iter().map(|&t| t as u64).sum::<u64>(), "problem built");

    Ok(Problem { config, trucks, routes, demand, route_index, max_segment, garage })
  }

  pub fn from_instance(data: &MineInstance) -> Result<Problem, ConfigError> {
    let config = MineConfiguration::new(data.edges.iter().cloned())?;
    Problem::new(config, data.trucks.clone(), data.demand.iter().cloned(), data.max_segment)
  }

  /// All trucks at the garage, nothing hauled yet, first segment.
  pub fn initial_state(&self) -> FleetState<'_> {
    let mut resident = vec![Vec::new(); self.config.num_locations()];
    resident[self.garage] = (0..self.trucks.len()).collect();
    FleetState {
      problem: self,
      resident,
      covered: vec![0; self.routes.len()],
      segment: 1,
      trips: 0,
    }
  }

  #[inline]
  pub fn config(&self) -> &MineConfiguration { &self.config }

  #[inline]
  pub fn trucks(&self) -> &[Truck] { &self.trucks }

  #[inline]
  pub fn truck(&self, t: TruckIdx) -> &Truck { &self.trucks[t] }

  #[inline]
  pub fn num_trucks(&self) -> usize { self.trucks.len() }

  pub fn find_truck(&self, name: &str) -> Option<TruckIdx> {
    self.trucks.iter().position(|t| t.name == name)
  }

  #[inline]
  pub fn routes(&self) -> &[(Loc, Loc)] { &self.routes }

  /// The demand route `src -> dst`, if there is one.
  #[inline]
  pub fn route(&self, src: Loc, dst: Loc) -> Option<RouteIdx> {
    self.route_index.get(&(src, dst)).copied()
  }

  #[inline]
  pub fn demand(&self, r: RouteIdx) -> Tonnage { self.demand[r] }

  #[inline]
  pub fn max_segment(&self) -> Segment { self.max_segment }

  #[inline]
  pub fn garage(&self) -> Loc { self.garage }

  pub fn largest_capacity(&self) -> Tonnage {
    self.trucks.first().map_or(0, |t| t.tonnage_capacity)
  }

  pub fn fleet_capacity(&self) -> u64 {
    self.trucks.iter().map(|t| t.tonnage_capacity as u64).sum()
  }
}


/// Identity of a state for duplicate detection: covered demand plus, per location, how
/// many trucks are there and their combined capacity. Which truck sits where is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
  covered: Vec<Tonnage>,
  fleet: Vec<(u32, u64)>,
}


/// A snapshot of the simulation: where each truck is, how much of each route has been
/// hauled, the current segment and the number of trips so far.
///
/// Only the residency and coverage tables belong to a state; the [`Problem`] is shared.
/// A state is never modified once built: [`FleetState::execute_action`] returns a new one.
#[derive(Clone)]
pub struct FleetState<'a> {
  problem: &'a Problem,
  /// Per location, the resident trucks in ascending index order (largest capacity first).
  resident: Vec<Vec<TruckIdx>>,
  covered: Vec<Tonnage>,
  segment: Segment,
  trips: Cost,
}

impl<'a> FleetState<'a> {
  pub fn new(problem: &'a Problem) -> Self {
    problem.initial_state()
  }

  #[inline]
  pub fn problem(&self) -> &'a Problem { self.problem }

  #[inline]
  pub fn segment(&self) -> Segment { self.segment }

  #[inline]
  pub fn trips(&self) -> Cost { self.trips }

  pub fn segments_left(&self) -> Segment {
    self.problem.max_segment.saturating_sub(self.segment)
  }

  #[inline]
  pub fn resident_trucks(&self, loc: Loc) -> &[TruckIdx] {
    &self.resident[loc]
  }

  #[inline]
  pub fn resident_count(&self, loc: Loc) -> usize {
    self.resident[loc].len()
  }

  /// Combined tonnage capacity of the trucks at `loc`.
  pub fn resident_tonnage(&self, loc: Loc) -> u64 {
    self.resident[loc].iter().map(|&t| self.problem.trucks[t].tonnage_capacity as u64).sum()
  }

  /// How many more trucks `loc` can hold.
  pub fn free_slots(&self, loc: Loc) -> u32 {
    self.problem.config.location(loc).resident_capacity.saturating_sub(self.resident[loc].len() as u32)
  }

  pub fn location_of(&self, t: TruckIdx) -> Option<Loc> {
    self.resident.iter().position(|trucks| trucks.binary_search(&t).is_ok())
  }

  #[inline]
  pub fn covered_demand(&self, r: RouteIdx) -> Tonnage { self.covered[r] }

  #[inline]
  pub fn remaining_demand(&self, r: RouteIdx) -> Tonnage {
    self.problem.demand[r] - self.covered[r]
  }

  pub fn total_covered_demand(&self) -> u64 {
    self.covered.iter().map(|&t| t as u64).sum()
  }

  pub fn total_remaining_demand(&self) -> u64 {
    (0..self.covered.len()).map(|r| self.remaining_demand(r) as u64).sum()
  }

  /// The whole fleet is back at the garage, within the horizon, with every route covered.
  pub fn is_successful(&self) -> bool {
    self.resident[self.problem.garage].len() == self.problem.trucks.len()
      && self.segment <= self.problem.max_segment
      && (0..self.covered.len()).all(|r| self.covered[r] >= self.problem.demand[r])
  }

  /// Candidate actions under the default [`Greedy`] policy.
  pub fn possible_actions(&self) -> Vec<Action> {
    Greedy.generate(self)
  }

  /// Candidate actions under an arbitrary policy.
  pub fn possible_actions_with<G: ActionGenerator + ?Sized>(&self, generator: &G) -> Vec<Action> {
    generator.generate(self)
  }

  /// Applies `action` to a copy of this state.
  ///
  /// An action made only of hauls on routes that still need tonnage is fast-forwarded: it is
  /// repeated for as many segments as it takes the first of those routes to be finished (or
  /// the horizon to be reached) in a single transition. Any other action takes one segment.
  pub fn execute_action(&self, action: &Action) -> FleetState<'a> {
    let mut next = self.clone();
    if self.qualifies_for_fast_forward(action) {
      next.fast_forward(action);
    } else {
      next.advance(action);
    }
    next
  }

  pub fn qualifies_for_fast_forward(&self, action: &Action) -> bool {
    !action.is_empty() && action.movements().iter().all(|m| {
      self.problem.route(m.source(), m.destination())
        .map_or(false, |r| self.remaining_demand(r) > 0)
    })
  }

  fn advance(&mut self, action: &Action) {
    self.segment += 1;
    for m in action.movements() {
      match self.problem.route(m.source(), m.destination()) {
        Some(r) => {
          // a haul is a round trip: the truck ends the segment where it started
          let hauled = min(m.tonnage(), self.remaining_demand(r));
          self.covered[r] += hauled;
        }
        None => self.relocate(m.truck(), m.source(), m.destination()),
      }
      self.trips += 1;
    }
  }

  fn fast_forward(&mut self, action: &Action) {
    let problem = self.problem;
    let groups = action.movements().iter()
      .filter_map(|m| problem.route(m.source(), m.destination()).map(|r| (r, m.tonnage() as u64)))
      .sorted_by_key(|&(r, _)| r)
      .group_by(|&(r, _)| r);
    let groups = groups.into_iter()
      .map(|(r, group)| {
        let (count, capacity) = group.fold((0u64, 0u64), |(n, c), (_, t)| (n + 1, c + t));
        (r, count, capacity)
      })
      .collect_vec();

    let until_finished = groups.iter()
      .map(|&(r, _, capacity)| num::Integer::div_ceil(&(self.remaining_demand(r) as u64), &capacity))
      .min()
      .unwrap_or(0);
    let n = min(until_finished, self.segments_left() as u64);

    self.segment += n as Segment;
    for (r, count, capacity) in groups {
      let hauled = min(self.remaining_demand(r) as u64, capacity * n);
      self.covered[r] += hauled as Tonnage;
      self.trips += count * n;
    }
    trace!(segments=n, segment=self.segment, trips=self.trips, "fast-forward");
  }

  fn relocate(&mut self, t: TruckIdx, src: Loc, dst: Loc) {
    match self.resident[src].binary_search(&t) {
      Ok(pos) => {
        self.resident[src].remove(pos);
        let at = self.resident[dst].binary_search(&t).unwrap_or_else(|at| at);
        self.resident[dst].insert(at, t);
      }
      Err(_) => {
        error!(truck=%self.problem.trucks[t].name, source=%self.problem.config.name(src), "truck is not at the source of its movement");
        debug_assert!(false, "movement of a truck that is not at its source");
      }
    }
  }

  /// Number of trucks and their combined capacity at `loc`.
  #[inline]
  pub fn fleet_signature(&self, loc: Loc) -> (u32, u64) {
    (self.resident[loc].len() as u32, self.resident_tonnage(loc))
  }

  pub fn key(&self) -> StateKey {
    StateKey {
      covered: self.covered.clone(),
      fleet: (0..self.resident.len()).map(|l| self.fleet_signature(l)).collect(),
    }
  }

  /// Single-segment transition regardless of whether the action could be fast-forwarded.
  #[cfg(test)]
  pub(crate) fn step(&self, action: &Action) -> FleetState<'a> {
    let mut next = self.clone();
    next.advance(action);
    next
  }

  /// Moves the named trucks from the garage to the named locations, without cost.
  #[cfg(test)]
  pub(crate) fn with_placement(mut self, placement: &[(&str, &str)]) -> FleetState<'a> {
    let garage = self.problem.garage;
    for (truck, loc) in placement {
      let t = self.problem.find_truck(truck).unwrap();
      let l = self.problem.config.find(loc).unwrap();
      self.relocate(t, garage, l);
    }
    self
  }
}

impl PartialEq for FleetState<'_> {
  fn eq(&self, other: &Self) -> bool {
    self.covered == other.covered
      && self.resident.len() == other.resident.len()
      && (0..self.resident.len()).all(|l| self.fleet_signature(l) == other.fleet_signature(l))
  }
}

impl Eq for FleetState<'_> {}

impl Hash for FleetState<'_> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.covered.hash(state);
    for l in 0..self.resident.len() {
      self.fleet_signature(l).hash(state);
    }
  }
}

impl fmt::Debug for FleetState<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let config = &self.problem.config;
    let resident: Vec<_> = (0..self.resident.len())
      .filter(|&l| !self.resident[l].is_empty())
      .map(|l| (config.name(l), self.resident[l].len()))
      .collect();
    f.debug_struct("FleetState")
      .field("segment", &self.segment)
      .field("trips", &self.trips)
      .field("covered", &self.covered)
      .field("resident", &resident)
      .finish()
  }
}
