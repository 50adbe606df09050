mod account;
mod favorite;
mod money;
mod payment;
mod progress;

pub use account::*;
pub use favorite::*;
pub use money::*;
pub use payment::*;
pub use progress::*;
