mod fixture;
mod pointer;
mod raw_match;
mod round;

pub use fixture::*;
pub use pointer::*;
pub use raw_match::*;
pub use round::*;
