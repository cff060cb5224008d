mod mem;
mod sled;

pub use mem::*;
pub use self::sled::*;
