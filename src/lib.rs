mod block;
mod error;
mod metrics;
mod path;
mod report;
mod resolve;
mod roi;
mod run;
mod stats;
mod utils;

pub use block::*;
pub use error::*;
pub use metrics::*;
pub use path::*;
pub use report::*;
pub use resolve::*;
pub use roi::*;
pub use run::*;
pub use stats::*;
pub use utils::*;
