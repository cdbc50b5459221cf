use std::path::Path;
use crate::Result;
use crate::raw::mine::RawMine;
use super::{
  ParseInstance,
  nom_prelude::*,
};

/// A `.mine` file on disk.
#[derive(Debug, Copy, Clone)]
pub struct MineFmt<P>(pub P);

/// `.mine` text already held in memory (builtin instances).
#[derive(Debug, Copy, Clone)]
pub struct MineStr<'a>(pub &'a str);

impl<P: AsRef<Path>> ParseInstance<MineFmt<P>> for RawMine {
  fn parse(path: MineFmt<P>) -> Result<RawMine> {
    let data = std::fs::read_to_string(path.0.as_ref())?;
    RawMine::parse(MineStr(&data))
  }
}

impl<'a> ParseInstance<MineStr<'a>> for RawMine {
  fn parse(input: MineStr<'a>) -> Result<RawMine> {
    match parsers::mine(input.0).finish() {
      Ok((_, instance)) => Ok(instance),
      Err(e) => Err(
        anyhow::Error::msg(error::convert_error(input.0, e))
      ),
    }
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  #[derive(Debug, Clone, PartialEq, Eq)]
  enum Statement<'a> {
    Name(&'a str),
    Segments(u32),
    Location(&'a str, u32),
    Edge(&'a str, &'a str),
    Truck(&'a str, u32),
    Demand(&'a str, &'a str, u32),
  }

  fn keyword<'a, E>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E>
    where
      E: ParseError<&'a str>
  {
    terminated(tag(kw), space1)
  }

  fn statement<'a, E>(i: &'a str) -> IResult<&'a str, Statement<'a>, E>
    where
      E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
  {
    alt((
      map(preceded(keyword("name"), ident), Statement::Name),
      map(preceded(keyword("segments"), u32_), Statement::Segments),
      map(
        preceded(keyword("location"), separated_pair(ident, space1, u32_)),
        |(name, capacity)| Statement::Location(name, capacity),
      ),
      map(
        preceded(keyword("edge"), separated_pair(ident, space1, ident)),
        |(src, dst)| Statement::Edge(src, dst),
      ),
      map(
        preceded(keyword("truck"), separated_pair(ident, space1, u32_)),
        |(name, tonnage)| Statement::Truck(name, tonnage),
      ),
      map(
        preceded(keyword("demand"), tuple((terminated(ident, space1), terminated(ident, space1), u32_))),
        |(src, dst, tonnage)| Statement::Demand(src, dst, tonnage),
      ),
    ))(i)
  }

  impl RawMine {
    fn apply(&mut self, stmt: Statement) {
      match stmt {
        Statement::Name(name) => self.name = Some(name.to_string()),
        Statement::Segments(n) => self.segments = Some(n),
        Statement::Location(name, capacity) => self.locations.push((name.to_string(), capacity)),
        Statement::Edge(src, dst) => self.edges.push((src.to_string(), dst.to_string())),
        Statement::Truck(name, tonnage) => self.trucks.push((name.to_string(), tonnage)),
        Statement::Demand(src, dst, tonnage) => self.demands.push((src.to_string(), dst.to_string(), tonnage)),
      }
    }
  }

  pub fn mine(input: &str) -> IResult<&str, RawMine, error::VerboseError<&str>> {
    let mut raw = RawMine::default();
    let mut input = input;

    loop {
      let (i, _) = space0(input)?;
      if i.is_empty() {
        input = i;
        break;
      }
      // blank and comment-only lines
      if let Ok((i, _)) = line_end::<error::VerboseError<&str>>(i) {
        input = i;
        continue;
      }
      let (i, stmt) = context("statement", statement)(i)?;
      let (i, _) = context("end of line", line_end)(i)?;
      raw.apply(stmt);
      input = i;
    }

    Ok((input, raw))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
# two-route sample
name sample
segments 6

location garage 4
location S1 2   # shovel
location C 2
edge garage S1
edge S1 garage
edge S1 C
truck truck_1 100
truck truck_2 80
demand S1 C 300
";

  #[test]
  fn parse_sample() -> Result<()> {
    let raw = RawMine::parse(MineStr(SAMPLE))?;
    assert_eq!(raw.name.as_deref(), Some("sample"));
    assert_eq!(raw.segments, Some(6));
    assert_eq!(raw.locations.len(), 3);
    assert_eq!(raw.locations[1], ("S1".to_string(), 2));
    assert_eq!(raw.edges.len(), 3);
    assert_eq!(raw.trucks, vec![("truck_1".to_string(), 100), ("truck_2".to_string(), 80)]);
    assert_eq!(raw.demands, vec![("S1".to_string(), "C".to_string(), 300)]);
    Ok(())
  }

  #[test]
  fn no_trailing_newline() -> Result<()> {
    let raw = RawMine::parse(MineStr("segments 3\nlocation garage 1"))?;
    assert_eq!(raw.locations, vec![("garage".to_string(), 1)]);
    Ok(())
  }

  #[test]
  fn reject_unknown_statement() {
    let err = RawMine::parse(MineStr("segments 3\nroad a b\n")).unwrap_err();
    assert!(err.to_string().contains("statement"), "{}", err);
  }

  #[test]
  fn reject_missing_argument() {
    assert!(RawMine::parse(MineStr("truck truck_1\n")).is_err());
  }
}
