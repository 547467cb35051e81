pub mod error;
pub mod goban;
pub mod katago;
pub mod record;
pub mod review;

pub mod utils {
    pub mod prelude {
        pub use crate::error::{Error, Result};

        pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
    }
}

pub mod prelude {
    pub use super::goban::prelude::*;
    pub use super::katago::prelude::*;
    pub use super::record::{GameRecord, RecordNode};
    pub use super::review::prelude::*;
    pub use super::utils::prelude::*;
}
