//! Traceroute process supervision and output parsing.

pub mod lines;
pub mod parser;
pub mod runner;
pub mod stream;

pub use lines::LineBuffer;
pub use parser::{classify_line, parse_line, parse_output, parse_target, HopLine};
pub use runner::{Platform, TraceSettings};
pub use stream::{RunId, SystemLauncher, TraceEvent, TraceLauncher, TraceProcess};
