use super::*;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::cmp::Ordering;
use itertools::Itertools;
use crate::Map;
use crate::parsers::{ParseInstance, MineFmt, MineStr};
use crate::raw::{FromRaw, mine::RawMine};

pub type Tonnage = u32;
pub type Segment = u32;

/// Name of the location every truck starts from and must return to.
pub const GARAGE: &str = "garage";

/// A place in the mine. Identified by name alone.
#[derive(Debug, Clone)]
pub struct Location {
  pub name: String,
  /// Maximum number of trucks simultaneously present.
  pub resident_capacity: u32,
}

impl Location {
  pub fn new(name: impl Into<String>, resident_capacity: u32) -> Self {
    Location { name: name.into(), resident_capacity }
  }
}

impl PartialEq for Location {
  fn eq(&self, other: &Self) -> bool { self.name == other.name }
}

impl Eq for Location {}

impl Hash for Location {
  fn hash<H: Hasher>(&self, state: &mut H) { self.name.hash(state) }
}

impl PartialOrd for Location {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Location {
  fn cmp(&self, other: &Self) -> Ordering { self.name.cmp(&other.name) }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (holds {} trucks)", self.name, self.resident_capacity)
  }
}

/// A haul truck. Identified by name alone.
#[derive(Debug, Clone)]
pub struct Truck {
  pub name: String,
  pub tonnage_capacity: Tonnage,
}

impl Truck {
  pub fn new(name: impl Into<String>, tonnage_capacity: Tonnage) -> Self {
    Truck { name: name.into(), tonnage_capacity }
  }
}

impl PartialEq for Truck {
  fn eq(&self, other: &Self) -> bool { self.name == other.name }
}

impl Eq for Truck {}

impl Hash for Truck {
  fn hash<H: Hasher>(&self, state: &mut H) { self.name.hash(state) }
}

impl PartialOrd for Truck {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Truck {
  fn cmp(&self, other: &Self) -> Ordering { self.name.cmp(&other.name) }
}

impl fmt::Display for Truck {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({} t)", self.name, self.tonnage_capacity)
  }
}


#[derive(Debug, Clone, Default)]
pub struct MineInstance {
  pub id: String,
  pub edges: Vec<(Location, Location)>,
  pub trucks: Vec<Truck>,
  pub demand: Vec<((Location, Location), Tonnage)>,
  pub max_segment: Segment,
}

impl MineInstance {
  pub fn total_demand(&self) -> u64 {
    self.demand.iter().map(|(_, t)| *t as u64).sum()
  }

  pub fn fleet_capacity(&self) -> u64 {
    self.trucks.iter().map(|t| t.tonnage_capacity as u64).sum()
  }
}

impl FromRaw<RawMine> for MineInstance {
  fn from_raw(raw: RawMine, id: Cow<str>) -> Result<MineInstance> {
    let mut locations: Map<&str, Location> = Map::default();
    for (name, capacity) in &raw.locations {
      if locations.insert(name.as_str(), Location::new(name.as_str(), *capacity)).is_some() {
        return Err(Error::DuplicateLocation(name.clone()).into());
      }
    }

    let lookup = |name: &String| -> Result<Location> {
      locations.get(name.as_str())
        .cloned()
        .ok_or_else(|| Error::UndeclaredLocation(name.clone()).into())
    };

    let edges = raw.edges.iter()
      .map(|(src, dst)| Ok((lookup(src)?, lookup(dst)?)))
      .collect::<Result<Vec<_>>>()?;

    let demand = raw.demands.iter()
      .map(|(src, dst, tonnage)| Ok(((lookup(src)?, lookup(dst)?), *tonnage)))
      .collect::<Result<Vec<_>>>()?;

    let trucks = raw.trucks.iter()
      .map(|(name, tonnage)| Truck::new(name.as_str(), *tonnage))
      .collect();

    let max_segment = raw.segments.ok_or(Error::MissingSegments)?;
    let id = raw.name.unwrap_or_else(|| id.into_owned());

    Ok(MineInstance { id, edges, trucks, demand, max_segment })
  }
}

/// Overrides the horizon of an instance.
pub fn with_segments(mut data: MineInstance, segments: Segment) -> MineInstance {
  data.max_segment = segments;
  data
}

/// Resizes the fleet to `size` trucks named `truck_1..=truck_size`, cycling through the
/// capacities of the existing fleet in order.
pub fn with_fleet_size(mut data: MineInstance, size: usize) -> MineInstance {
  let capacities = data.trucks.iter().map(|t| t.tonnage_capacity).collect_vec();
  if capacities.is_empty() {
    data.trucks.clear();
    return data;
  }
  data.trucks = capacities.iter()
    .cycle()
    .take(size)
    .enumerate()
    .map(|(i, &c)| Truck::new(format!("truck_{}", i + 1), c))
    .collect();
  data
}


pub enum MineFile {}

impl Dataset for StdLayout<MineFile> {
  type Instance = MineInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    let instance = self.index_to_name(idx)?;
    let path = self.path(idx);
    let raw = RawMine::parse(MineFmt(path)).context(format!("failed to load {:?}", path))?;
    MineInstance::from_raw(raw, instance).context(format!("invalid instance {:?}", path))
  }
}

impl Dataset for Builtin<MineFile> {
  type Instance = MineInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    let instance = self.index_to_name(idx)?;
    let raw = RawMine::parse(MineStr(self.text(idx)))
      .context(format!("failed to parse builtin instance {}", instance))?;
    MineInstance::from_raw(raw, instance)
  }
}

pub static BUILTIN: Builtin<MineFile> = Builtin::new(&[
  ("tiny", include_str!("../../data/tiny.mine")),
  ("small", include_str!("../../data/small.mine")),
  ("pit", include_str!("../../data/pit.mine")),
]);

/// The builtin instances, followed by every `*.mine` file under `$DATA_ROOT` if it is set.
pub fn collection() -> Result<DSetCollection<MineInstance>> {
  let builder = DSetCollection::builder().push_ref(&BUILTIN);
  let builder = match std::env::var("DATA_ROOT") {
    Ok(root) => builder.push_owned(StdLayout::<MineFile>::new(&root, "mine")?),
    Err(_) => builder,
  };
  builder.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(text: &str) -> RawMine {
    RawMine::parse(MineStr(text)).unwrap()
  }

  #[test]
  fn load_builtin() -> Result<()> {
    for idx in 0..BUILTIN.len() {
      let data = BUILTIN.load_instance(idx)?;
      assert_eq!(data.id, BUILTIN.index_to_name(idx)?);
      assert!(data.max_segment > 0);
      assert!(!data.trucks.is_empty());
    }
    Ok(())
  }

  #[test]
  fn small_matches_reference_mine() -> Result<()> {
    let data = BUILTIN.load_instance_by_name("small")?;
    assert_eq!(data.trucks.len(), 9);
    assert_eq!(data.max_segment, 15);
    assert_eq!(data.total_demand(), 800);
    assert_eq!(data.edges.len(), 9);
    Ok(())
  }

  #[test]
  fn location_identity_is_name() {
    assert_eq!(Location::new("S1", 2), Location::new("S1", 5));
    assert_ne!(Truck::new("a", 10), Truck::new("b", 10));
    assert!(Location::new("C", 2) < Location::new("garage", 1));
  }

  #[test]
  fn undeclared_location() {
    let r = raw("segments 2\nlocation garage 1\nedge garage S1\n");
    let err = MineInstance::from_raw(r, "x".into()).unwrap_err();
    assert!(err.to_string().contains("S1"));
  }

  #[test]
  fn duplicate_location() {
    let r = raw("segments 2\nlocation garage 1\nlocation garage 3\n");
    assert!(MineInstance::from_raw(r, "x".into()).is_err());
  }

  #[test]
  fn missing_segments() {
    let r = raw("location garage 1\n");
    assert!(MineInstance::from_raw(r, "x".into()).is_err());
  }

  #[test]
  fn resize_fleet() -> Result<()> {
    let data = BUILTIN.load_instance_by_name("pit")?;
    let resized = with_fleet_size(data, 5);
    let caps = resized.trucks.iter().map(|t| t.tonnage_capacity).collect_vec();
    assert_eq!(caps, vec![10, 8, 20, 10, 8]);
    assert_eq!(resized.trucks[4].name, "truck_5");
    Ok(())
  }

  #[test]
  fn override_segments() -> Result<()> {
    let data = with_segments(BUILTIN.load_instance_by_name("tiny")?, 9);
    assert_eq!(data.max_segment, 9);
    Ok(())
  }
}
