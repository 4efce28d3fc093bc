mod output;

pub use output::{Output, excerpt};
