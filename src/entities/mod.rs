pub mod location;
pub mod named;
pub mod user;

pub use location::{Location, LocationStatus};
pub use named::{JobCategory, JobType, Named, NamedKind, ProductGroup};
pub use user::{Role, User, UserStatus};
