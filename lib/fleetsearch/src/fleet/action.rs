use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use itertools::Itertools;

use crate::*;

/// One truck going from `source` to `destination` during one segment. If the pair is a
/// demand route, the truck hauls its capacity there and back; otherwise it relocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Movement {
  truck: TruckIdx,
  source: Loc,
  destination: Loc,
  tonnage: Tonnage,
}

impl Movement {
  /// The tonnage carried is the truck's capacity.
  pub fn new(problem: &Problem, truck: TruckIdx, source: Loc, destination: Loc) -> Self {
    Movement { truck, source, destination, tonnage: problem.truck(truck).tonnage_capacity }
  }

  #[inline]
  pub fn truck(&self) -> TruckIdx { self.truck }

  #[inline]
  pub fn source(&self) -> Loc { self.source }

  #[inline]
  pub fn destination(&self) -> Loc { self.destination }

  #[inline]
  pub fn tonnage(&self) -> Tonnage { self.tonnage }

  /// Truck, source and destination names.
  pub fn describe<'p>(&self, problem: &'p Problem) -> (&'p str, &'p str, &'p str) {
    let config = problem.config();
    (&problem.truck(self.truck).name, config.name(self.source), config.name(self.destination))
  }

  pub fn display<'p>(&self, problem: &'p Problem) -> MovementDisplay<'p> {
    MovementDisplay { movement: *self, problem }
  }
}

pub struct MovementDisplay<'p> {
  movement: Movement,
  problem: &'p Problem,
}

impl fmt::Display for MovementDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (truck, src, dst) = self.movement.describe(self.problem);
    write!(f, "{}: {} -> {}", truck, src, dst)
  }
}


/// The set of movements dispatched together in one decision.
///
/// Two actions are equal when they send the same number of trucks, carrying the same
/// total tonnage, along every (source, destination) pair. Which individual trucks are
/// sent does not matter.
#[derive(Debug, Clone, Default)]
pub struct Action {
  movements: Vec<Movement>,
}

impl Action {
  pub fn new(movements: Vec<Movement>) -> Self {
    Action { movements }
  }

  #[inline]
  pub fn movements(&self) -> &[Movement] { &self.movements }

  #[inline]
  pub fn len(&self) -> usize { self.movements.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.movements.is_empty() }

  pub fn push(&mut self, m: Movement) {
    self.movements.push(m);
  }

  /// `(source, destination, trucks, tonnage)` per pair, sorted by pair.
  pub fn profile(&self) -> Vec<(Loc, Loc, u32, u64)> {
    self.movements.iter()
      .map(|m| ((m.source, m.destination), m.tonnage as u64))
      .into_group_map()
      .into_iter()
      .map(|((src, dst), tonnage)| (src, dst, tonnage.len() as u32, tonnage.iter().sum()))
      .sorted()
      .collect()
  }
}

impl PartialEq for Action {
  fn eq(&self, other: &Self) -> bool {
    self.movements.len() == other.movements.len() && self.profile() == other.profile()
  }
}

impl Eq for Action {}

impl Hash for Action {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.profile().hash(state)
  }
}

impl FromIterator<Movement> for Action {
  fn from_iter<T: IntoIterator<Item=Movement>>(iter: T) -> Self {
    Action { movements: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::get_instance_by_name;
  use crate::Set;

  fn small() -> Problem {
    Problem::from_instance(&get_instance_by_name("small").unwrap()).unwrap()
  }

  #[test]
  fn equality_ignores_truck_identity() {
    let problem = small();
    let config = problem.config();
    let (garage, s1) = (problem.garage(), config.find("S1").unwrap());
    let a = Action::new(vec![Movement::new(&problem, 0, garage, s1), Movement::new(&problem, 1, garage, s1)]);
    let b = Action::new(vec![Movement::new(&problem, 3, garage, s1), Movement::new(&problem, 7, garage, s1)]);
    let c = Action::new(vec![Movement::new(&problem, 3, garage, s1)]);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let set: Set<_> = vec![a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn profile_groups_by_pair() {
    let problem = small();
    let config = problem.config();
    let (garage, s1, l1) = (problem.garage(), config.find("S1").unwrap(), config.find("L1").unwrap());
    let action: Action = vec![
      Movement::new(&problem, 2, garage, l1),
      Movement::new(&problem, 0, garage, s1),
      Movement::new(&problem, 1, garage, l1),
    ].into_iter().collect();
    let mut expected = vec![(garage, l1, 2, 200), (garage, s1, 1, 100)];
    expected.sort();
    assert_eq!(action.profile(), expected);
    assert_eq!(action.len(), 3);
  }

  #[test]
  fn display() {
    let problem = small();
    let config = problem.config();
    let m = Movement::new(&problem, 0, problem.garage(), config.find("S1").unwrap());
    assert_eq!(m.display(&problem).to_string(), format!("{}: garage -> S1", problem.truck(0).name));
  }
}
