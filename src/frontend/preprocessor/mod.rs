pub use self::char_offset::{CharOffset, clean_comments};

mod char_offset;
