mod classify;
mod error;
mod intake;
mod lifecycle;
mod roles;
mod routing;
mod types;

pub use classify::*;
pub use error::*;
pub use intake::*;
pub use lifecycle::*;
pub use roles::*;
pub use routing::*;
pub use types::*;
