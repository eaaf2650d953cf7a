use std::fmt;

use crate::meta::Meta;

/// metadata type for location data (used by generated parser)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Default)]
pub struct LocationMeta {
    /// byte offset from the beginning of source code
    pub offset: usize,
}

impl From<usize> for LocationMeta {
    fn from(offset: usize) -> Self {
        Self { offset }
    }
}

impl fmt::Display for LocationMeta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "@{}", self.offset)
    }
}

pub trait GetLocation {
    fn get_location(&self) -> LocationMeta;
}

impl<ItemT> GetLocation for Meta<ItemT, LocationMeta> {
    fn get_location(&self) -> LocationMeta {
        self.get_meta().clone()
    }
}
