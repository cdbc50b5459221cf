use std::path::{Path, PathBuf};
use std::borrow::Cow;
use std::collections::HashMap;
use std::marker::PhantomData;
use anyhow::{Context, Result};
use crate::Error;


pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }

  fn check_idx(&self, idx: usize) -> Result<()> {
    if self.len() <= idx {
      Err(Error::IndexOutOfRange.into())
    } else {
      Ok(())
    }
  }
}


impl<'a, D: IdxNameMap> IdxNameMap for &'a D {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    D::index_to_name(self, idx)
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    D::name_to_index(self, name)
  }

  fn len(&self) -> usize {
    D::len(self)
  }
}

pub trait Dataset: IdxNameMap + Sync {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;

  fn load_instance_by_name(&self, name: &str) -> Result<Self::Instance> {
    self.load_instance(self.name_to_index(name)?)
  }
}


impl<'a, D: Dataset> Dataset for &'a D {
  type Instance = D::Instance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    D::load_instance(self, idx)
  }
}


/// A directory of instance files `NAME.SUFFIX`. Instances are indexed in file-name order.
pub struct StdLayout<D> {
  _marker: PhantomData<D>,
  paths: Vec<PathBuf>,
  name_to_idx_map: HashMap<String, usize>,
}


impl<D> StdLayout<D> {
  pub fn new(dir: impl AsRef<Path>, suffix: &str) -> Result<StdLayout<D>> {
    let dir = dir.as_ref();
    let dir = dir.canonicalize().with_context(|| format!("try read directory {:?}", dir))?;

    let pattern = dir.join(format!("*.{}", suffix));
    let pattern = pattern.to_string_lossy();
    let mut paths = glob::glob(&pattern)?.collect::<std::result::Result<Vec<PathBuf>, _>>()?;
    paths.sort();

    let mut name_to_idx_map = HashMap::with_capacity(paths.len());
    for (k, p) in paths.iter().enumerate() {
      let n = p.file_stem().ok_or_else(|| anyhow::anyhow!("missing file stem: {:?}", p))?;
      name_to_idx_map.insert(n.to_string_lossy().into_owned(), k);
    }

    Ok(StdLayout {
      _marker: PhantomData {},
      paths,
      name_to_idx_map,
    })
  }

  fn path(&self, idx: usize) -> &Path {
    &self.paths[idx]
  }
}

impl<D> IdxNameMap for StdLayout<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    let name = self.paths[idx].file_stem()
      .ok_or_else(|| anyhow::anyhow!("missing file stem for idx {}", idx))?;
    Ok(name.to_string_lossy())
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.name_to_idx_map.get(name).copied().ok_or_else(|| Error::UnknownInstanceName.into())
  }

  fn len(&self) -> usize { self.paths.len() }
}


/// Instances compiled into the binary, as `(name, text)` pairs.
pub struct Builtin<D> {
  _marker: PhantomData<D>,
  entries: &'static [(&'static str, &'static str)],
}

impl<D> Builtin<D> {
  pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
    Builtin { _marker: PhantomData, entries }
  }

  fn text(&self, idx: usize) -> &'static str {
    self.entries[idx].1
  }
}

impl<D> IdxNameMap for Builtin<D> {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    Ok(Cow::Borrowed(self.entries[idx].0))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.entries.iter()
      .position(|(n, _)| *n == name)
      .ok_or_else(|| Error::UnknownInstanceName.into())
  }

  fn len(&self) -> usize { self.entries.len() }
}


#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum DSetIdx {
  Owned(usize),
  Ref(usize),
}


pub struct DSetCollectionBuilder<I: 'static> {
  static_refs: Vec<&'static dyn Dataset<Instance=I>>,
  owned: Vec<Box<dyn Dataset<Instance=I>>>,
  order: Vec<DSetIdx>,
}

impl<I> DSetCollectionBuilder<I> {
  pub fn push_owned<D: Dataset<Instance=I> + 'static>(mut self, dset: D) -> Self {
    self.order.push(DSetIdx::Owned(self.owned.len()));
    self.owned.push(Box::new(dset));
    self
  }

  pub fn push_ref<D: Dataset<Instance=I>>(mut self, dset: &'static D) -> Self {
    self.order.push(DSetIdx::Ref(self.static_refs.len()));
    self.static_refs.push(dset);
    self
  }

  pub fn finish(self) -> Result<DSetCollection<I>> {
    let DSetCollectionBuilder { static_refs, order, owned } = self;
    let mut name_to_idx = HashMap::new();
    let mut dset_lengths = Vec::with_capacity(order.len());
    let mut offset = 0;

    for didx in &order {
      let dset = match didx {
        DSetIdx::Owned(idx) => owned[*idx].as_ref(),
        DSetIdx::Ref(idx) => static_refs[*idx],
      };

      for i in 0..dset.len() {
        let name = dset.index_to_name(i)?.into_owned();
        if name_to_idx.insert(name.clone(), i + offset).is_some() {
          return Err(Error::DuplicateInstanceName(name).into());
        }
      }
      dset_lengths.push(dset.len());
      offset += dset.len();
    }

    Ok(DSetCollection { order, owned, static_refs, dset_lengths, length: offset, name_to_idx })
  }
}


/// Several datasets presented as one, indexed in the order they were pushed.
pub struct DSetCollection<I: 'static> {
  static_refs: Vec<&'static dyn Dataset<Instance=I>>,
  owned: Vec<Box<dyn Dataset<Instance=I>>>,
  order: Vec<DSetIdx>,
  dset_lengths: Vec<usize>,
  name_to_idx: HashMap<String, usize>,
  length: usize,
}

impl<I> DSetCollection<I> {
  pub fn builder() -> DSetCollectionBuilder<I> {
    DSetCollectionBuilder { static_refs: Vec::new(), owned: Vec::new(), order: Vec::new() }
  }

  fn get_dset(&self, didx: DSetIdx) -> &dyn Dataset<Instance=I> {
    match didx {
      DSetIdx::Owned(idx) => self.owned[idx].as_ref(),
      DSetIdx::Ref(idx) => self.static_refs[idx],
    }
  }

  fn map_index(&self, idx: usize) -> Result<(DSetIdx, usize)> {
    let mut offset = 0;
    for (&dlen, didx) in self.dset_lengths.iter().zip(&self.order) {
      offset += dlen;
      if idx < offset {
        return Ok((*didx, idx - (offset - dlen)));
      }
    }
    Err(Error::IndexOutOfRange.into())
  }
}

impl<I> IdxNameMap for DSetCollection<I> {
  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.name_to_idx.get(name)
      .copied()
      .ok_or_else(|| Error::UnknownInstanceName.into())
  }

  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    let (didx, idx) = self.map_index(idx)?;
    self.get_dset(didx).index_to_name(idx)
  }

  fn len(&self) -> usize { self.length }
}

impl<I> Dataset for DSetCollection<I> {
  type Instance = I;

  fn load_instance(&self, idx: usize) -> Result<I> {
    let (didx, idx) = self.map_index(idx)?;
    self.get_dset(didx).load_instance(idx)
  }
}


pub mod mine;
