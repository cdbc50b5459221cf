use std::cmp::{max, Reverse};
use std::collections::BinaryHeap;
use std::ops::ControlFlow;
use std::rc::Rc;
use rayon::prelude::*;
use tracing::*;

use crate::*;

pub mod heuristic;
pub mod node;
pub mod progress;

/// Counters collected over one run of [`BestFirstSearch::solve_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
  /// Nodes whose children were generated. A node the listener stopped the search on is not counted.
  pub expanded: u64,
  pub generated: u64,
  /// Children the heuristic marked as dead ends, or beyond the horizon.
  pub pruned: u64,
  pub discarded_explored: u64,
  pub discarded_open: u64,
  /// Open nodes superseded by a cheaper equivalent.
  pub replaced: u64,
  pub peak_frontier: usize,
}

#[derive(Debug)]
pub enum Outcome<'a> {
  Solved(Rc<SearchNode<'a>>),
  /// The frontier was exhausted.
  NoSolution,
  /// A [`ProgressListener`] stopped the search.
  Aborted,
}

impl<'a> Outcome<'a> {
  pub fn solution(&self) -> Option<&SearchNode<'a>> {
    match self {
      Outcome::Solved(node) => Some(node.as_ref()),
      _ => None,
    }
  }

  pub fn is_solved(&self) -> bool {
    matches!(self, Outcome::Solved(_))
  }
}

#[derive(Debug)]
pub struct SearchResult<'a> {
  pub outcome: Outcome<'a>,
  pub stats: SearchStats,
}

impl<'a> SearchResult<'a> {
  pub fn solution(&self) -> Option<&SearchNode<'a>> {
    self.outcome.solution()
  }

  /// Trips made by the solution, if there is one.
  pub fn cost(&self) -> Option<Cost> {
    self.solution().map(SearchNode::trips)
  }
}

/// Open nodes, ordered by cost and then by insertion. Replacing a node leaves its old heap
/// entry behind; stale entries are skipped when popped.
struct Frontier<'a> {
  heap: BinaryHeap<Reverse<(Cost, u64)>>,
  nodes: Map<u64, (StateKey, Rc<SearchNode<'a>>)>,
  index: Map<StateKey, (Cost, u64)>,
  next_seq: u64,
}

impl<'a> Frontier<'a> {
  fn new() -> Self {
    Frontier { heap: BinaryHeap::new(), nodes: Map::default(), index: Map::default(), next_seq: 0 }
  }

  fn push(&mut self, key: StateKey, node: Rc<SearchNode<'a>>) {
    let seq = self.next_seq;
    self.next_seq += 1;
    if let Some((_, stale)) = self.index.insert(key.clone(), (node.cost(), seq)) {
      self.nodes.remove(&stale);
    }
    self.heap.push(Reverse((node.cost(), seq)));
    self.nodes.insert(seq, (key, node));
  }

  fn pop(&mut self) -> Option<(StateKey, Rc<SearchNode<'a>>)> {
    while let Some(Reverse((_, seq))) = self.heap.pop() {
      if let Some((key, node)) = self.nodes.remove(&seq) {
        self.index.remove(&key);
        return Some((key, node));
      }
    }
    None
  }

  fn cost_of(&self, key: &StateKey) -> Option<Cost> {
    self.index.get(key).map(|&(cost, _)| cost)
  }

  fn len(&self) -> usize {
    self.nodes.len()
  }
}

/// Best-first search over fleet states, ranked by trips so far plus a [`Heuristic`]
/// estimate. With [`Zero`] this is uniform-cost search.
///
/// States already expanded are never reopened, so the first solution popped is optimal only
/// for a consistent heuristic and a generator that offers every action.
pub struct BestFirstSearch<'a, H, G> {
  problem: &'a Problem,
  heuristic: H,
  generator: G,
  parallel: bool,
}

impl<'a> BestFirstSearch<'a, Zero, Greedy> {
  pub fn uniform_cost(problem: &'a Problem) -> Self {
    BestFirstSearch { problem, heuristic: Zero, generator: Greedy, parallel: false }
  }
}

impl<'a, H: Heuristic> BestFirstSearch<'a, H, Greedy> {
  pub fn a_star(problem: &'a Problem, heuristic: H) -> Self {
    BestFirstSearch { problem, heuristic, generator: Greedy, parallel: false }
  }
}

impl<'a, H, G> BestFirstSearch<'a, H, G> {
  pub fn with_generator<G2: ActionGenerator>(self, generator: G2) -> BestFirstSearch<'a, H, G2> {
    BestFirstSearch { problem: self.problem, heuristic: self.heuristic, generator, parallel: self.parallel }
  }

  pub fn with_heuristic<H2: Heuristic>(self, heuristic: H2) -> BestFirstSearch<'a, H2, G> {
    BestFirstSearch { problem: self.problem, heuristic, generator: self.generator, parallel: self.parallel }
  }

  /// Evaluate the children of each node on the rayon thread pool.
  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  pub fn problem(&self) -> &'a Problem {
    self.problem
  }
}

impl<'a, H: Heuristic, G: ActionGenerator> BestFirstSearch<'a, H, G> {
  pub fn solve(&self) -> SearchResult<'a> {
    self.solve_with(&mut Silent)
  }

  #[instrument(level="info", skip(self, listener), fields(trucks=self.problem.num_trucks(), max_segment=self.problem.max_segment()))]
  pub fn solve_with<L: ProgressListener + ?Sized>(&self, listener: &mut L) -> SearchResult<'a> {
    let max_segment = self.problem.max_segment();
    let mut frontier = Frontier::new();
    let mut explored: Set<StateKey> = Set::default();
    let mut stats = SearchStats::default();

    let root = SearchNode::root(self.problem.initial_state());
    frontier.push(root.state().key(), Rc::new(root));
    stats.peak_frontier = 1;

    while let Some((key, node)) = frontier.pop() {
      explored.insert(key);

      if node.is_successful() {
        info!(trips=node.trips(), segment=node.state().segment(), ?stats, "solution found");
        return SearchResult { outcome: Outcome::Solved(node), stats };
      }

      let progress = Progress {
        iteration: stats.expanded + 1,
        estimated_cost: node.cost(),
        trips: node.trips(),
        segment: node.state().segment(),
        frontier: frontier.len(),
        covered: node.state().total_covered_demand(),
      };
      if let ControlFlow::Break(()) = listener.on_expand(&progress) {
        info!(?stats, "search aborted");
        return SearchResult { outcome: Outcome::Aborted, stats };
      }
      stats.expanded += 1;

      let children = self.expand(node.state());
      debug!(iteration=stats.expanded, cost=node.cost(), segment=node.state().segment(), children=children.len(), "expanded");
      for (action, state, estimate) in children {
        stats.generated += 1;
        let estimate = match estimate {
          Some(h) if state.segment() <= max_segment => h,
          _ => {
            trace!(segment=state.segment(), "dead end");
            stats.pruned += 1;
            continue;
          }
        };
        let cost = state.trips().saturating_add(estimate);
        let key = state.key();

        if explored.contains(&key) {
          stats.discarded_explored += 1;
          continue;
        }
        match frontier.cost_of(&key) {
          Some(open_cost) if open_cost <= cost => {
            stats.discarded_open += 1;
            continue;
          }
          Some(open_cost) => {
            trace!(open_cost, cost, "replacing open node");
            stats.replaced += 1;
          }
          None => {}
        }
        frontier.push(key, Rc::new(SearchNode::child(&node, action, state, cost)));
      }
      stats.peak_frontier = max(stats.peak_frontier, frontier.len());
    }

    info!(?stats, "no solution");
    SearchResult { outcome: Outcome::NoSolution, stats }
  }

  /// Children of `state` in the order the generator proposed their actions.
  fn expand(&self, state: &FleetState<'a>) -> Vec<(Action, FleetState<'a>, Option<Cost>)> {
    let actions = self.generator.generate(state);
    let evaluate = |action: Action| {
      let next = state.execute_action(&action);
      let estimate = self.heuristic.estimate(&next);
      (action, next, estimate)
    };
    if self.parallel && actions.len() > 1 {
      actions.into_par_iter().map(evaluate).collect()
    } else {
      actions.into_iter().map(evaluate).collect()
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::get_instance_by_name;
  use crate::data::mine::GARAGE;

  fn problem(name: &str) -> Problem {
    Problem::from_instance(&get_instance_by_name(name).unwrap()).unwrap()
  }

  /// Two disjoint shovel-to-crusher routes, each worked by one truck.
  fn two_routes(max_segment: Segment) -> Problem {
    let garage = Location::new("garage", 4);
    let (s1, s2) = (Location::new("S1", 1), Location::new("S2", 1));
    let (c1, c2) = (Location::new("C1", 1), Location::new("C2", 1));
    let config = MineConfiguration::new(vec![
      (garage.clone(), s1.clone()),
      (garage.clone(), s2.clone()),
      (s1.clone(), garage.clone()),
      (s2.clone(), garage.clone()),
      (s1.clone(), c1.clone()),
      (s2.clone(), c2.clone()),
    ]).unwrap();
    let trucks = vec![Truck::new("truck_a", 100), Truck::new("truck_b", 100)];
    Problem::new(config, trucks, vec![((s1, c1), 200), ((s2, c2), 300)], max_segment).unwrap()
  }

  #[test]
  fn single_truck_single_route() {
    let _g = init_test_logging(None::<&str>);
    let problem = problem("tiny");
    let result = BestFirstSearch::uniform_cost(&problem).solve();
    let goal = result.solution().unwrap();
    assert_eq!(goal.trips(), 3);
    assert_eq!(goal.state().segment(), 4);
    assert_eq!(goal.state().covered_demand(0), 100);
    assert_eq!(goal.state().resident_count(problem.garage()), 1);
    assert_eq!(goal.path_from_root().len(), 4);
  }

  #[test]
  fn infeasible_demand_exhausts_frontier() {
    let mut data = get_instance_by_name("tiny").unwrap();
    data.demand[0].1 = 1000;
    let problem = Problem::from_instance(&data).unwrap();

    let result = BestFirstSearch::uniform_cost(&problem).solve();
    assert!(matches!(result.outcome, Outcome::NoSolution));
    assert_eq!(result.cost(), None);
    assert!(result.stats.expanded > 0);

    let result = BestFirstSearch::a_star(&problem, LowerBound).solve();
    assert!(matches!(result.outcome, Outcome::NoSolution));
    assert_eq!(result.stats.expanded, 1);
  }

  #[test]
  fn disjoint_routes_cost_adds_up() {
    let problem = two_routes(12);
    // 1 trip out, 2 hauls, 1 trip back on the first route; 1 out, 3 hauls, 1 back on the second
    let expected = 4 + 5;
    assert_eq!(BestFirstSearch::uniform_cost(&problem).solve().cost(), Some(expected));
    assert_eq!(BestFirstSearch::a_star(&problem, LowerBound).solve().cost(), Some(expected));
    let exhaustive = BestFirstSearch::uniform_cost(&problem).with_generator(Combinatorial::default()).solve();
    assert_eq!(exhaustive.cost(), Some(expected));
  }

  #[test]
  fn small_mine() {
    let problem = problem("small");
    let result = BestFirstSearch::uniform_cost(&problem).solve();
    let goal = result.solution().unwrap();
    assert_eq!(goal.trips(), 20);
    assert_eq!(goal.state().segment(), 7);
    assert!(goal.path_from_root().iter().all(|n| n.state().segment() <= problem.max_segment()));
  }

  #[test]
  fn repeated_runs_agree() {
    let problem = two_routes(12);
    let search = BestFirstSearch::uniform_cost(&problem).with_generator(Combinatorial::default());
    let first = search.solve();
    let second = search.solve();
    assert_eq!(first.cost(), second.cost());
    assert_eq!(first.stats, second.stats);

    let parallel = BestFirstSearch::uniform_cost(&problem).with_generator(Combinatorial::default()).parallel(true).solve();
    assert_eq!(parallel.cost(), first.cost());
    assert_eq!(parallel.stats, first.stats);
  }

  #[test]
  fn listener_sees_every_expansion_and_can_abort() {
    let problem = problem("small");
    let mut seen = Vec::new();
    let mut record = |p: &Progress| { seen.push(p.iteration); ControlFlow::Continue(()) };
    let result = BestFirstSearch::uniform_cost(&problem).solve_with(&mut record);
    assert_eq!(seen.len() as u64, result.stats.expanded);
    assert_eq!(seen, (1..=result.stats.expanded).collect::<Vec<_>>());

    let result = BestFirstSearch::uniform_cost(&problem).solve_with(&mut Budget::new().max_iterations(2));
    assert!(matches!(result.outcome, Outcome::Aborted));
    assert_eq!(result.stats.expanded, 2);
    assert_eq!(result.stats.generated, 2);
  }

  /// A single truck wandering between the garage and two stops. The route out of `S1` is
  /// never served, so every run ends without a solution once the script runs out.
  fn wander_mine() -> Problem {
    let garage = Location::new(GARAGE, 4);
    let (s1, s2, c) = (Location::new("S1", 2), Location::new("S2", 2), Location::new("C", 2));
    let config = MineConfiguration::new(vec![
      (garage.clone(), s1.clone()),
      (garage.clone(), s2.clone()),
      (s2.clone(), s1.clone()),
      (s1.clone(), s2.clone()),
      (s1.clone(), garage.clone()),
      (s1.clone(), c.clone()),
    ]).unwrap();
    Problem::new(config, vec![Truck::new("truck_1", 100)], vec![((s1, c), 100)], 10).unwrap()
  }

  /// From the garage: `S1`, `S2`, then `S1` again. From `S2`: `S1`. From `S1`: back to the
  /// garage or on to `S2`, both already expanded by then.
  struct Scripted;

  impl ActionGenerator for Scripted {
    fn generate(&self, state: &FleetState<'_>) -> Vec<Action> {
      let problem = state.problem();
      let config = problem.config();
      let src = state.location_of(0).unwrap();
      let go = |dst: &str| Action::new(vec![Movement::new(problem, 0, src, config.find(dst).unwrap())]);
      match config.name(src) {
        GARAGE => vec![go("S1"), go("S2"), go("S1")],
        "S2" => vec![go("S1")],
        "S1" => vec![go(GARAGE), go("S2")],
        _ => Vec::new(),
      }
    }
  }

  /// Reaching `S1` directly from the garage looks expensive; arriving later through `S2` does not.
  fn detour(state: &FleetState<'_>) -> Option<Cost> {
    let s1 = state.problem().config().find("S1")?;
    if state.resident_count(s1) > 0 && state.segment() == 2 { Some(10) } else { Some(0) }
  }

  #[test]
  fn cheaper_duplicate_replaces_open_node() {
    let _g = init_test_logging(None::<&str>);
    let problem = wander_mine();
    let mut expanded = Vec::new();
    let mut record = |p: &Progress| { expanded.push((p.estimated_cost, p.segment)); ControlFlow::Continue(()) };
    let result = BestFirstSearch::a_star(&problem, detour)
      .with_generator(Scripted)
      .solve_with(&mut record);

    assert!(matches!(result.outcome, Outcome::NoSolution));
    let stats = result.stats;
    assert_eq!(stats.expanded, 3);
    assert_eq!(stats.generated, 6);
    assert_eq!(stats.pruned, 0);
    // the second garage -> S1 child is no cheaper than the open one
    assert_eq!(stats.discarded_open, 1);
    // S2 -> S1 at cost 2 supersedes garage -> S1 at cost 11
    assert_eq!(stats.replaced, 1);
    // both moves out of S1 lead back to expanded states
    assert_eq!(stats.discarded_explored, 2);
    assert_eq!(stats.peak_frontier, 2);
    // the superseded cost-11 entry is never expanded
    assert_eq!(expanded, vec![(0, 1), (1, 2), (2, 3)]);
  }

  #[test]
  fn frontier_skips_superseded_entries() {
    let problem = problem("tiny");
    let root = Rc::new(SearchNode::root(problem.initial_state()));
    let action = root.state().possible_actions().remove(0);
    let state = root.state().execute_action(&action);
    let key = state.key();

    let mut frontier = Frontier::new();
    frontier.push(key.clone(), Rc::new(SearchNode::child(&root, action.clone(), state.clone(), 5)));
    frontier.push(key.clone(), Rc::new(SearchNode::child(&root, action, state, 3)));
    assert_eq!(frontier.len(), 1);
    assert_eq!(frontier.cost_of(&key), Some(3));

    let (popped, node) = frontier.pop().unwrap();
    assert_eq!(popped, key);
    assert_eq!(node.cost(), 3);
    assert!(frontier.pop().is_none());
    assert_eq!(frontier.cost_of(&key), None);
    assert_eq!(frontier.len(), 0);
  }

  #[test]
  fn frontier_breaks_ties_by_insertion() {
    let problem = problem("tiny");
    let root = Rc::new(SearchNode::root(problem.initial_state()));
    let action = root.state().possible_actions().remove(0);
    let state = root.state().execute_action(&action);
    let (first, second) = (state.key(), root.state().key());

    let mut frontier = Frontier::new();
    frontier.push(first.clone(), Rc::new(SearchNode::child(&root, action, state, 4)));
    frontier.push(second.clone(), Rc::new(SearchNode::root(problem.initial_state())));
    frontier.push(first.clone(), Rc::new(SearchNode::root(problem.initial_state())));
    // both keys now at cost 0; `second` was queued at that cost first
    assert_eq!(frontier.pop().map(|(k, _)| k), Some(second));
    assert_eq!(frontier.pop().map(|(k, _)| k), Some(first));
    assert!(frontier.pop().is_none());
  }

  fn never(_: &FleetState<'_>) -> Option<Cost> { None }

  #[test]
  fn dead_ends_are_pruned() {
    let problem = problem("tiny");
    let result = BestFirstSearch::a_star(&problem, never).solve();
    assert!(matches!(result.outcome, Outcome::NoSolution));
    assert_eq!(result.stats.pruned, result.stats.generated);
  }
}
