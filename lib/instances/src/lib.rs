pub use anyhow::Result;

use std::fmt;
use fnv::FnvHashMap as Map;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Error {
    UnknownInstanceName,
    IndexOutOfRange,
    DuplicateInstanceName(String),
    DuplicateLocation(String),
    UndeclaredLocation(String),
    MissingSegments,
}


impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateInstanceName(name) => write!(f, "instance name `{}` appears in more than one dataset", name),
            Error::DuplicateLocation(name) => write!(f, "location `{}` is declared twice", name),
            Error::UndeclaredLocation(name) => write!(f, "location `{}` is used but never declared", name),
            Error::MissingSegments => write!(f, "instance does not declare a number of segments"),
            _ => fmt::Debug::fmt(self, f),
        }
    }
}

impl std::error::Error for Error {}


pub mod dataset;
pub mod modify;
pub mod raw;

mod parsers;
pub use parsers::{ParseInstance, MineFmt, MineStr};
