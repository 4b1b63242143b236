pub mod io;
pub mod report;
pub mod types;
mod xml;

pub use io::*;
pub use report::gift_report;
pub use types::*;
