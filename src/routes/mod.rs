mod admin;
mod count;
mod health_check;
mod signups;

pub use admin::*;
pub use count::*;
pub use health_check::*;
pub use signups::*;
