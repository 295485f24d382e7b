// Domain-layer modules and shared errors/models
pub mod search {
    pub use crate::search::*;
}

pub mod flattener {
    pub use crate::flattener::*;
}

pub mod request_builder {
    pub use crate::request_builder::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
