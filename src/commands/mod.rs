pub mod general;
pub mod house;

pub use general::{help, ping};
pub use house::house;
