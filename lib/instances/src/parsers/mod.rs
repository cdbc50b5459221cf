mod mine;
pub use mine::{MineFmt, MineStr};


mod nom_prelude {
  pub use nom::{
    IResult,
    error::{
      self,
      ParseError,
      FromExternalError,
      context,
    },
    branch::alt,
    sequence::*,
    combinator::*,
    character::complete::*,
    bytes::complete::{tag, take_while1},
    Finish,
  };
  pub use std::str::FromStr;
  pub use std::num::ParseIntError;
}

mod common;

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
