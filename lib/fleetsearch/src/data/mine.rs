pub use instances::dataset::mine::{
  Location,
  Truck,
  Tonnage,
  Segment,
  MineInstance,
  GARAGE,
};

use crate::{Map, Set, ConfigError};

/// Index of a location in [`MineConfiguration::locations`]. Indices follow name order.
pub type Loc = usize;

/// The mine as a directed graph of locations. Immutable once built; every simulation
/// state refers to the same configuration.
#[derive(Debug, Clone)]
pub struct MineConfiguration {
  locations: Vec<Location>,
  index: Map<String, Loc>,
  outgoing: Vec<Vec<Loc>>,
  incoming: Vec<Vec<Loc>>,
  edges: Set<(Loc, Loc)>,
}

impl MineConfiguration {
  /// Builds the graph from its directed edges; the locations are inferred from the pairs.
  pub fn new<I>(connections: I) -> Result<Self, ConfigError>
    where
      I: IntoIterator<Item=(Location, Location)>
  {
    let connections: Vec<_> = connections.into_iter().collect();

    let mut locations: Vec<Location> = Vec::new();
    {
      let mut seen: Map<&str, u32> = Map::default();
      for loc in connections.iter().flat_map(|(s, d)| vec![s, d]) {
        match seen.get(loc.name.as_str()) {
          Some(&c) if c != loc.resident_capacity => {
            return Err(ConfigError::ConflictingCapacity {
              location: loc.name.clone(),
              first: c,
              second: loc.resident_capacity,
            });
          }
          Some(_) => {}
          None => {
            seen.insert(&loc.name, loc.resident_capacity);
            locations.push(loc.clone());
          }
        }
      }
    }
    locations.sort();

    let index: Map<String, Loc> = locations.iter()
      .enumerate()
      .map(|(i, l)| (l.name.clone(), i))
      .collect();

    let mut outgoing = vec![Vec::new(); locations.len()];
    let mut incoming = vec![Vec::new(); locations.len()];
    let mut edges = Set::default();
    for (src, dst) in &connections {
      let (i, j) = (index[&src.name], index[&dst.name]);
      if edges.insert((i, j)) {
        outgoing[i].push(j);
        incoming[j].push(i);
      }
    }
    for adj in outgoing.iter_mut().chain(incoming.iter_mut()) {
      adj.sort_unstable();
    }

    Ok(MineConfiguration { locations, index, outgoing, incoming, edges })
  }

  /// All locations, in name order.
  pub fn locations(&self) -> &[Location] {
    &self.locations
  }

  pub fn num_locations(&self) -> usize {
    self.locations.len()
  }

  #[inline]
  pub fn location(&self, loc: Loc) -> &Location {
    &self.locations[loc]
  }

  #[inline]
  pub fn name(&self, loc: Loc) -> &str {
    &self.locations[loc].name
  }

  pub fn find(&self, name: &str) -> Option<Loc> {
    self.index.get(name).copied()
  }

  /// Locations reachable from `loc` in one move, in name order.
  #[inline]
  pub fn destinations(&self, loc: Loc) -> &[Loc] {
    &self.outgoing[loc]
  }

  /// Locations from which `loc` can be reached in one move, in name order.
  #[inline]
  pub fn incoming(&self, loc: Loc) -> &[Loc] {
    &self.incoming[loc]
  }

  #[inline]
  pub fn has_edge(&self, src: Loc, dst: Loc) -> bool {
    self.edges.contains(&(src, dst))
  }

  pub fn num_edges(&self) -> usize {
    self.edges.len()
  }
}
