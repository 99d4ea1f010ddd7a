mod badges;
mod emotes;
mod nom_parser;
pub mod tags;
mod types;

pub use self::badges::{Badge, Badges};
pub use self::emotes::{EmoteRange, EmoteRanges};
pub use self::nom_parser::ParsedLine;
pub use self::tags::{Color, Tag, TagName, TagValue, Tags};
pub use self::types::{Message, Outgoing};
