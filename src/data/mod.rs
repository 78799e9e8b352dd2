pub mod events;
pub mod traces;
pub mod units;
pub mod window;
