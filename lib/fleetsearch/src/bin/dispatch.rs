use rayon::ThreadPoolBuilder;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};
use tracing::*;

use fleetsearch::*;
use fleetsearch::data::{Overrides, get_instance_with, read_instance};

mod common;
use common::*;

use structopt::StructOpt;

#[derive(Debug, Copy, Clone)]
enum HeuristicKind {
    Zero,
    LowerBound,
    Throughput,
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "zero" => Ok(Self::Zero),
            "bound" => Ok(Self::LowerBound),
            "throughput" => Ok(Self::Throughput),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

#[derive(Debug, Copy, Clone)]
enum GeneratorKind {
    Greedy,
    Combinatorial,
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "greedy" => Ok(Self::Greedy),
            "combinatorial" => Ok(Self::Combinatorial),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}


/// Plans the dispatch of a haul fleet over a mine so every demand route is covered within
/// the horizon using as few truck movements as possible.
#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Name of a built-in or $DATA_ROOT instance, or path to a .mine file
    #[structopt()]
    instance: String,
    /// Override the number of segments in the horizon
    #[structopt(long, validator=clap_range_validator(Some(1u32), None))]
    segments: Option<Segment>,
    /// Override the fleet size, cycling through the instance's truck capacities
    #[structopt(long, validator=clap_range_validator(Some(1usize), None))]
    trucks: Option<usize>,
    #[structopt(long, parse(try_from_str), possible_values=&["zero", "bound", "throughput"], default_value="zero")]
    heuristic: HeuristicKind,
    #[structopt(long, parse(try_from_str), possible_values=&["greedy", "combinatorial"], default_value="greedy")]
    generator: GeneratorKind,
    /// Cap on the actions enumerated per state by the combinatorial generator
    #[structopt(long, default_value="256", validator=clap_range_validator(Some(1usize), None))]
    max_actions: usize,
    #[structopt(long)]
    max_iterations: Option<u64>,
    /// Wall-clock limit in seconds
    #[structopt(long, validator=clap_range_validator(Some(0f64), None))]
    time_limit: Option<f64>,
    /// Log a progress line every N expansions
    #[structopt(long)]
    progress: Option<u64>,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(flatten)]
    output: OutputOptions,
}


struct RunReport {
    instance: String,
    status: &'static str,
    stats: SearchStats,
    schedule: Option<DispatchSchedule>,
}

impl RunReport {
    fn summary(&self) -> json::JsonValue {
        let s = &self.stats;
        let mut root = json::object! {
            instance: self.instance.as_str(),
            status: self.status,
            expanded: s.expanded,
            generated: s.generated,
            pruned: s.pruned,
            discarded_explored: s.discarded_explored,
            discarded_open: s.discarded_open,
            replaced: s.replaced,
            peak_frontier: s.peak_frontier,
        };
        if let Some(schedule) = &self.schedule {
            root["total_trips"] = schedule.total_trips.into();
            root["final_segment"] = schedule.final_segment.into();
            root["tons_moved"] = schedule.tons_moved.into();
        }
        root
    }
}

impl Report for RunReport {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let mut root = self.summary();
        if let Some(schedule) = &self.schedule {
            root["schedule"] = schedule.to_json();
        }
        root.write_pretty(&mut buf, 2)?;
        return Ok(())
    }

    fn write_json_summary(&self, mut buf : impl Write) -> Result<()> {
        self.summary().write_pretty(&mut buf, 2)?;
        return Ok(())
    }

    fn write_text(&self, mut buf : impl Write) -> Result<()> {
        match &self.schedule {
            Some(schedule) => schedule.write_text(&mut buf)?,
            None => writeln!(buf, "{}: {}", self.instance, self.status)?,
        }
        return Ok(())
    }
}


fn budget(args: &ClArgs) -> Budget {
    let mut budget = Budget::new();
    if let Some(n) = args.max_iterations {
        budget = budget.max_iterations(n);
    }
    if let Some(secs) = args.time_limit {
        budget = budget.time_limit(Duration::from_secs_f64(secs));
    }
    if let Some(n) = args.progress {
        budget = budget.log_every(n);
    }
    budget
}

fn run<H: Heuristic, G: ActionGenerator>(search: BestFirstSearch<'_, H, G>, args: &ClArgs, id: &str) -> RunReport {
    let result = search.parallel(args.cpus > 1).solve_with(&mut budget(args));
    let status = match &result.outcome {
        Outcome::Solved(_) => "solved",
        Outcome::NoSolution => "no-solution",
        Outcome::Aborted => "aborted",
    };
    RunReport {
        instance: id.to_string(),
        status,
        stats: result.stats,
        schedule: result.solution().map(DispatchSchedule::from_solution),
    }
}

fn run_with_generator<G: ActionGenerator>(problem: &Problem, generator: G, args: &ClArgs, id: &str) -> RunReport {
    let search = BestFirstSearch::uniform_cost(problem).with_generator(generator);
    match args.heuristic {
        HeuristicKind::Zero => run(search, args, id),
        HeuristicKind::LowerBound => run(search.with_heuristic(LowerBound), args, id),
        HeuristicKind::Throughput => run(search.with_heuristic(Throughput), args, id),
    }
}


fn main() -> anyhow::Result<()> {
    let args : ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone())?;
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global()?;

    let overrides = Overrides { segments: args.segments, trucks: args.trucks };
    let data = if Path::new(&args.instance).is_file() {
        read_instance(&args.instance, &overrides)?
    } else {
        get_instance_with(&args.instance, &overrides)?
    };
    let problem = Problem::from_instance(&data)
        .with_context(|| format!("instance {} is not valid", data.id))?;
    info!(instance=%data.id, trucks=problem.num_trucks(), routes=problem.routes().len(), max_segment=problem.max_segment(), "loaded");

    let report = match args.generator {
        GeneratorKind::Greedy => run_with_generator(&problem, Greedy, &args, &data.id),
        GeneratorKind::Combinatorial => run_with_generator(&problem, Combinatorial::new(args.max_actions), &args, &data.id),
    };
    output_report(&args.output, report)?;
    Ok(())
}
