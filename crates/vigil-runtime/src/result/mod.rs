//! Result tree and report rendering

mod node;
mod report;

pub use node::{Counts, NodeKind, ResultNode, Walk};
pub use report::{JsonReport, TextReport};
