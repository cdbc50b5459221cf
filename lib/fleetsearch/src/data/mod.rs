use std::path::Path;
use anyhow::{Context, Result};
use instances::{ParseInstance, MineFmt};
use instances::dataset::{Dataset, mine::{collection, with_fleet_size, with_segments}};
use instances::modify::DSetModify;
use instances::raw::{FromRaw, mine::RawMine};

pub mod mine;
use mine::{MineInstance, Segment};

/// Run parameters that replace what an instance declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
  pub segments: Option<Segment>,
  pub trucks: Option<usize>,
}

impl Overrides {
  pub fn apply(&self, mut data: MineInstance) -> MineInstance {
    if let Some(n) = self.segments {
      data = with_segments(data, n);
    }
    if let Some(n) = self.trucks {
      data = with_fleet_size(data, n);
    }
    data
  }
}

pub fn get_instance_by_name(name: &str) -> Result<MineInstance> {
  get_instance_with(name, &Overrides::default())
}

pub fn get_instance_by_index(idx: usize) -> Result<MineInstance> {
  collection()?.load_instance(idx)
}

/// Looks `name` up among the builtin instances and those under `$DATA_ROOT`.
pub fn get_instance_with(name: &str, overrides: &Overrides) -> Result<MineInstance> {
  let dset = collection()?;
  let dset = (&dset).map(|data| overrides.apply(data));
  dset.load_instance_by_name(name).with_context(|| format!("cannot load instance `{}`", name))
}

/// Reads a single `.mine` file.
pub fn read_instance(path: impl AsRef<Path>, overrides: &Overrides) -> Result<MineInstance> {
  let path = path.as_ref();
  let raw = RawMine::parse(MineFmt(path)).with_context(|| format!("failed to load {:?}", path))?;
  let id = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
  let data = MineInstance::from_raw(raw, id)?;
  Ok(overrides.apply(data))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[should_panic]
  fn fail_load_instance() {
    get_instance_by_name("non-existent").unwrap();
  }

  #[test]
  #[should_panic]
  fn fail_load_instance_idx() {
    get_instance_by_index(999).unwrap();
  }

  #[test]
  fn overrides_apply() -> Result<()> {
    let overrides = Overrides { segments: Some(30), trucks: Some(4) };
    let data = get_instance_with("small", &overrides)?;
    assert_eq!(data.max_segment, 30);
    assert_eq!(data.trucks.len(), 4);
    Ok(())
  }
}
