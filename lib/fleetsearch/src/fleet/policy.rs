use itertools::Itertools;
use tracing::*;

use crate::*;

/// Produces the candidate actions for a state. Implementations must be deterministic:
/// the same state always yields the same actions in the same order.
pub trait ActionGenerator: Sync {
  fn generate(&self, state: &FleetState<'_>) -> Vec<Action>;
}

impl<G: ActionGenerator + ?Sized> ActionGenerator for &G {
  fn generate(&self, state: &FleetState<'_>) -> Vec<Action> {
    (**self).generate(state)
  }
}

/// Builds at most one action per state by dispatching every resident truck somewhere.
///
/// Locations are visited in index order, and trucks at each location largest first. A truck
/// is sent, in order of preference:
/// 1. along an outgoing demand route that still needs tonnage, one truck per free slot at the
///    destination, until the route's remaining tonnage is spoken for;
/// 2. to a neighbour which itself has an outgoing demand route that still needs tonnage, while
///    the neighbour has free slots;
/// 3. back to the garage, unless it is already there. This ignores edges and garage capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl ActionGenerator for Greedy {
  fn generate(&self, state: &FleetState<'_>) -> Vec<Action> {
    let problem = state.problem();
    let config = problem.config();
    if state.segment() >= problem.max_segment() {
      return Vec::new();
    }

    let mut slots = (0..config.num_locations()).map(|l| state.free_slots(l)).collect_vec();
    let mut action = Action::default();

    for src in (0..config.num_locations()).filter(|&l| state.resident_count(l) > 0) {
      let residents = state.resident_trucks(src);
      let mut next = 0;
      let (hauls, relays): (Vec<Loc>, Vec<Loc>) = config.destinations(src).iter()
        .copied()
        .partition(|&dst| problem.route(src, dst).is_some());

      for dst in hauls {
        let r = match problem.route(src, dst) {
          Some(r) => r,
          None => continue,
        };
        let mut remaining = state.remaining_demand(r);
        while remaining > 0 && next < residents.len() && slots[dst] > 0 {
          let m = Movement::new(problem, residents[next], src, dst);
          remaining = remaining.saturating_sub(m.tonnage());
          action.push(m);
          slots[dst] -= 1;
          next += 1;
        }
      }

      for dst in relays {
        if next == residents.len() { break; }
        if !leads_to_open_route(state, dst) { continue; }
        while next < residents.len() && slots[dst] > 0 {
          action.push(Movement::new(problem, residents[next], src, dst));
          slots[dst] -= 1;
          next += 1;
        }
      }

      if src != problem.garage() {
        for &t in &residents[next..] {
          action.push(Movement::new(problem, t, src, problem.garage()));
        }
      }
    }

    trace!(movements=action.len(), segment=state.segment(), "greedy dispatch");
    if action.is_empty() { Vec::new() } else { vec![action] }
  }
}

fn leads_to_open_route(state: &FleetState<'_>, via: Loc) -> bool {
  let problem = state.problem();
  problem.config().destinations(via).iter()
    .any(|&dst| problem.route(via, dst).map_or(false, |r| state.remaining_demand(r) > 0))
}


/// Enumerates every way of splitting the resident trucks over "stay put" and each outgoing
/// edge, treating trucks of the same capacity at the same location as interchangeable.
/// Edges whose demand is already covered and destinations without free slots are skipped.
///
/// Enumeration stops after `max_actions` distinct actions.
#[derive(Debug, Clone, Copy)]
pub struct Combinatorial {
  pub max_actions: usize,
}

impl Combinatorial {
  pub fn new(max_actions: usize) -> Self {
    Combinatorial { max_actions }
  }
}

impl Default for Combinatorial {
  fn default() -> Self { Combinatorial::new(256) }
}

/// Trucks of one capacity at one location, and where they may go.
struct TruckClass {
  source: Loc,
  trucks: Vec<TruckIdx>,
  options: Vec<Loc>,
}

struct Enumeration<'c, 'p> {
  problem: &'p Problem,
  classes: &'c [TruckClass],
  slots: Vec<u32>,
  current: Vec<Movement>,
  seen: Set<Action>,
  actions: Vec<Action>,
  limit: usize,
}

impl Enumeration<'_, '_> {
  fn full(&self) -> bool {
    self.actions.len() >= self.limit
  }

  fn visit(&mut self, k: usize) {
    if self.full() { return; }
    if k == self.classes.len() {
      if !self.current.is_empty() {
        let action = Action::new(self.current.clone());
        if self.seen.insert(action.clone()) {
          self.actions.push(action);
        }
      }
      return;
    }
    self.distribute(k, 0, 0);
  }

  /// Sends between zero and as many trucks as fit along option `opt` of class `k`, with
  /// `assigned` trucks of the class already sent along earlier options.
  fn distribute(&mut self, k: usize, opt: usize, assigned: usize) {
    let classes = self.classes;
    let class = &classes[k];
    if opt == class.options.len() {
      self.visit(k + 1);
      return;
    }
    let dst = class.options[opt];
    let most = std::cmp::min(self.slots[dst] as usize, class.trucks.len() - assigned);
    for n in 0..=most {
      for &t in &class.trucks[assigned..assigned + n] {
        self.current.push(Movement::new(self.problem, t, class.source, dst));
      }
      self.slots[dst] -= n as u32;
      self.distribute(k, opt + 1, assigned + n);
      self.slots[dst] += n as u32;
      let len = self.current.len();
      self.current.truncate(len - n);
      if self.full() { return; }
    }
  }
}

impl ActionGenerator for Combinatorial {
  fn generate(&self, state: &FleetState<'_>) -> Vec<Action> {
    let problem = state.problem();
    let config = problem.config();
    if state.segment() >= problem.max_segment() || self.max_actions == 0 {
      return Vec::new();
    }

    let mut classes = Vec::new();
    for src in (0..config.num_locations()).filter(|&l| state.resident_count(l) > 0) {
      let options = config.destinations(src).iter()
        .copied()
        .filter(|&dst| problem.route(src, dst).map_or(true, |r| state.remaining_demand(r) > 0))
        .collect_vec();
      if options.is_empty() { continue; }
      let by_capacity = state.resident_trucks(src).iter()
        .group_by(|&&t| problem.truck(t).tonnage_capacity);
      for (_, trucks) in &by_capacity {
        classes.push(TruckClass { source: src, trucks: trucks.copied().collect(), options: options.clone() });
      }
    }

    let mut e = Enumeration {
      problem,
      classes: &classes,
      slots: (0..config.num_locations()).map(|l| state.free_slots(l)).collect(),
      current: Vec::new(),
      seen: Set::default(),
      actions: Vec::new(),
      limit: self.max_actions,
    };
    e.visit(0);
    if e.full() {
      debug!(limit=self.max_actions, segment=state.segment(), "action enumeration truncated");
    }
    e.actions
  }
}
