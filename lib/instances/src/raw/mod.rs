pub mod mine;
use std::borrow::Cow;

/// Conversion from the parsed, untyped form of an instance into its typed form.
pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> crate::Result<Self>;
}
