use std::io::{self, Write};
use itertools::Itertools;

use crate::*;

/// One truck movement, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
  pub truck: String,
  pub source: String,
  pub destination: String,
}

/// The movements decided together at one node of the solution path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchStep {
  /// Depth of the node on the solution path, starting at 1.
  pub index: usize,
  /// Segment in which the movements start.
  pub segment: Segment,
  /// Number of segments the movements are repeated for (more than one after a fast-forward).
  pub segments: Segment,
  /// Trips made in this step.
  pub trips: Cost,
  /// Tonnage hauled in this step.
  pub tons_moved: u64,
  pub movements: Vec<Dispatch>,
}

/// A solution rendered as a named, ordered dispatch plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSchedule {
  pub total_trips: Cost,
  pub final_segment: Segment,
  pub tons_moved: u64,
  pub steps: Vec<DispatchStep>,
}

impl DispatchSchedule {
  pub fn from_solution(goal: &SearchNode<'_>) -> Self {
    let problem = goal.state().problem();
    let steps = goal.path_from_root()
      .windows(2)
      .filter_map(|w| {
        let (before, after) = (w[0].state(), w[1].state());
        let action = w[1].action()?;
        let movements = action.movements().iter()
          .map(|m| {
            let (truck, source, destination) = m.describe(problem);
            Dispatch { truck: truck.to_string(), source: source.to_string(), destination: destination.to_string() }
          })
          .collect();
        Some(DispatchStep {
          index: w[1].depth(),
          segment: before.segment(),
          segments: after.segment() - before.segment(),
          trips: after.trips() - before.trips(),
          tons_moved: after.total_covered_demand() - before.total_covered_demand(),
          movements,
        })
      })
      .collect_vec();

    DispatchSchedule {
      total_trips: goal.trips(),
      final_segment: goal.state().segment(),
      tons_moved: goal.state().total_covered_demand(),
      steps,
    }
  }

  pub fn to_json(&self) -> json::JsonValue {
    let steps = self.steps.iter()
      .map(|s| json::object! {
        index: s.index,
        segment: s.segment,
        segments: s.segments,
        trips: s.trips,
        tons_moved: s.tons_moved,
        movements: s.movements.iter()
          .map(|m| json::array![m.truck.as_str(), m.source.as_str(), m.destination.as_str()])
          .collect_vec(),
      })
      .collect_vec();

    json::object! {
      total_trips: self.total_trips,
      final_segment: self.final_segment,
      tons_moved: self.tons_moved,
      steps: steps,
    }
  }

  pub fn write_text(&self, mut buf: impl Write) -> io::Result<()> {
    writeln!(buf, "Total number of trips: {}", self.total_trips)?;
    for s in &self.steps {
      writeln!(buf)?;
      writeln!(buf, "Dispatch: {}\tSegment: {}\tSegments: {}\tTons moved: {}", s.index, s.segment, s.segments, s.tons_moved)?;
      for m in &s.movements {
        writeln!(buf, "{}: {} -> {}", m.truck, m.source, m.destination)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::get_instance_by_name;

  #[test]
  fn tiny_schedule() {
    let problem = Problem::from_instance(&get_instance_by_name("tiny").unwrap()).unwrap();
    let result = BestFirstSearch::uniform_cost(&problem).solve();
    let schedule = DispatchSchedule::from_solution(result.solution().unwrap());

    assert_eq!(schedule.total_trips, 3);
    assert_eq!(schedule.tons_moved, 100);
    assert_eq!(schedule.steps.len(), 3);
    assert_eq!(schedule.steps.iter().map(|s| s.trips).sum::<Cost>(), schedule.total_trips);
    assert_eq!(schedule.steps[1].movements, vec![Dispatch {
      truck: "truck_1".into(),
      source: "shovel".into(),
      destination: "crusher".into(),
    }]);
    assert_eq!(schedule.steps[1].tons_moved, 100);

    let json = schedule.to_json();
    assert_eq!(json["total_trips"], 3);
    assert_eq!(json["steps"][2]["movements"][0][2], "garage");

    let mut text = Vec::new();
    schedule.write_text(&mut text).unwrap();
    let text = String::from_utf8(text).unwrap();
    assert!(text.starts_with("Total number of trips: 3\n"));
    assert!(text.contains("truck_1: shovel -> crusher\n"));
  }

  #[test]
  fn fast_forward_spans_several_segments() {
    let problem = Problem::from_instance(&get_instance_by_name("small").unwrap()).unwrap();
    let result = BestFirstSearch::uniform_cost(&problem).solve();
    let schedule = DispatchSchedule::from_solution(result.solution().unwrap());
    assert_eq!(schedule.tons_moved, 800);
    assert_eq!(
      schedule.steps.iter().map(|s| s.segments).sum::<Segment>() + 1,
      schedule.final_segment
    );
  }
}
