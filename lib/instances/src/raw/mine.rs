/// A mine instance exactly as written in a `.mine` file: names are unresolved and
/// statements are kept in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMine {
  pub name: Option<String>,
  pub segments: Option<u32>,
  pub locations: Vec<(String, u32)>,
  pub edges: Vec<(String, String)>,
  pub trucks: Vec<(String, u32)>,
  pub demands: Vec<(String, String, u32)>,
}
