mod parse;
mod serialize;
mod types;

pub(crate) use serialize::middle_param;
pub use serialize::Request;
pub use types::Command;
