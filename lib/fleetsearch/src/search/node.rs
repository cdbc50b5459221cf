use std::fmt;
use std::rc::Rc;

use crate::*;

/// A state reached by the search, with the action that produced it and a link to the node it
/// was expanded from. Parents are shared between siblings.
pub struct SearchNode<'a> {
  state: FleetState<'a>,
  action: Option<Action>,
  parent: Option<Rc<SearchNode<'a>>>,
  cost: Cost,
  depth: usize,
}

impl<'a> SearchNode<'a> {
  pub fn root(state: FleetState<'a>) -> Self {
    SearchNode { state, action: None, parent: None, cost: 0, depth: 0 }
  }

  /// `cost` is the priority of the child: trips so far plus the heuristic estimate.
  pub fn child(parent: &Rc<SearchNode<'a>>, action: Action, state: FleetState<'a>, cost: Cost) -> Self {
    SearchNode {
      state,
      action: Some(action),
      parent: Some(Rc::clone(parent)),
      cost,
      depth: parent.depth + 1,
    }
  }

  #[inline]
  pub fn state(&self) -> &FleetState<'a> { &self.state }

  /// `None` for the root.
  #[inline]
  pub fn action(&self) -> Option<&Action> { self.action.as_ref() }

  #[inline]
  pub fn parent(&self) -> Option<&SearchNode<'a>> { self.parent.as_deref() }

  #[inline]
  pub fn cost(&self) -> Cost { self.cost }

  #[inline]
  pub fn trips(&self) -> Cost { self.state.trips() }

  #[inline]
  pub fn depth(&self) -> usize { self.depth }

  pub fn is_successful(&self) -> bool {
    self.state.is_successful()
  }

  /// Nodes from the root down to and including this one.
  pub fn path_from_root(&self) -> Vec<&SearchNode<'a>> {
    let mut path = Vec::with_capacity(self.depth + 1);
    let mut node = Some(self);
    while let Some(n) = node {
      path.push(n);
      node = n.parent();
    }
    path.reverse();
    path
  }
}

impl fmt::Debug for SearchNode<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SearchNode")
      .field("cost", &self.cost)
      .field("depth", &self.depth)
      .field("state", &self.state)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::get_instance_by_name;

  #[test]
  fn path_follows_parents() {
    let problem = Problem::from_instance(&get_instance_by_name("tiny").unwrap()).unwrap();
    let root = Rc::new(SearchNode::root(problem.initial_state()));
    let action = root.state().possible_actions().remove(0);
    let state = root.state().execute_action(&action);
    let child = Rc::new(SearchNode::child(&root, action.clone(), state, 1));
    let grandchild_action = child.state().possible_actions().remove(0);
    let state = child.state().execute_action(&grandchild_action);
    let grandchild = SearchNode::child(&child, grandchild_action, state, 2);

    let path = grandchild.path_from_root();
    assert_eq!(path.len(), 3);
    assert_eq!(grandchild.depth(), 2);
    assert!(path[0].action().is_none());
    assert_eq!(path[1].action(), Some(&action));
    assert!(std::ptr::eq(path[1], &*child));
    assert_eq!(root.path_from_root().len(), 1);
  }
}
