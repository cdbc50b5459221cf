use super::nom_prelude::*;

pub fn u32_<'a, E>(input: &'a str) -> IResult<&'a str, u32, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, u32::from_str)(input)
}

/// A location or truck name: letters, digits, `_`, `-` and `.`.
pub fn ident<'a, E>(input: &'a str) -> IResult<&'a str, &'a str, E>
  where
    E: ParseError<&'a str>
{
  take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')(input)
}

/// Trailing whitespace, an optional `#` comment and the end of the line (or input).
pub fn line_end<'a, E>(input: &'a str) -> IResult<&'a str, (), E>
  where
    E: ParseError<&'a str>
{
  value(
    (),
    tuple((
      space0,
      opt(pair(char('#'), not_line_ending)),
      alt((line_ending, eof)),
    ))
  )(input)
}

#[cfg(test)]
mod tests {
  use super::*;
  type E<'a> = error::VerboseError<&'a str>;

  #[test]
  fn parse_ident() {
    assert_eq!(ident::<E>("truck_1 100"), Ok((" 100", "truck_1")));
    assert!(ident::<E>(" truck").is_err());
  }

  #[test]
  fn parse_line_end() {
    assert_eq!(line_end::<E>("   # a comment\nnext"), Ok(("next", ())));
    assert_eq!(line_end::<E>(""), Ok(("", ())));
    assert!(line_end::<E>("  extra\n").is_err());
  }
}
