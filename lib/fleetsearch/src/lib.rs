use std::fmt;
use std::path::Path;
use fnv::{FnvHashMap, FnvHashSet};

pub mod data;
pub mod fleet;
pub mod search;
pub mod schedule;

pub use data::mine::{Location, Truck, Tonnage, Segment, MineConfiguration, Loc};
pub use fleet::{Problem, FleetState, Cost, TruckIdx, RouteIdx, StateKey};
pub use fleet::action::{Action, Movement};
pub use fleet::policy::{ActionGenerator, Greedy, Combinatorial};
pub use search::{BestFirstSearch, Outcome, SearchResult, SearchStats};
pub use search::node::SearchNode;
pub use search::heuristic::{Heuristic, Zero, LowerBound, Throughput, Clamped};
pub use search::progress::{Progress, ProgressListener, Budget, Silent};
pub use schedule::DispatchSchedule;

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;


/// Problems with a mine description or fleet that are detected before any search starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingGarage,
    EmptyHorizon,
    UnknownLocation(String),
    MissingEdge { source: String, destination: String },
    DuplicateRoute { source: String, destination: String },
    DuplicateTruck(String),
    ZeroCapacity(String),
    ConflictingCapacity { location: String, first: u32, second: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingGarage =>
                write!(f, "the mine has no location named `{}`", data::mine::GARAGE),
            ConfigError::EmptyHorizon =>
                write!(f, "the horizon must contain at least one segment"),
            ConfigError::UnknownLocation(name) =>
                write!(f, "demand refers to location `{}` which is not in the mine", name),
            ConfigError::MissingEdge { source, destination } =>
                write!(f, "demand route {} -> {} is not an edge of the mine", source, destination),
            ConfigError::DuplicateRoute { source, destination } =>
                write!(f, "demand route {} -> {} is given more than once", source, destination),
            ConfigError::DuplicateTruck(name) =>
                write!(f, "truck `{}` appears more than once in the fleet", name),
            ConfigError::ZeroCapacity(name) =>
                write!(f, "truck `{}` has no tonnage capacity", name),
            ConfigError::ConflictingCapacity { location, first, second } =>
                write!(f, "location `{}` is given resident capacities {} and {}", location, first, second),
        }
    }
}

impl std::error::Error for ConfigError {}


mod logging_setup {
    use super::*;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> anyhow::Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Installs the global subscriber: human-readable events on stderr filtered by `RUST_LOG`,
    /// plus newline-delimited JSON in `logfile` if one is given. Keep the returned guard alive
    /// until the program exits so the file writer is flushed.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> anyhow::Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;

