pub mod sad;
pub mod search;
pub mod window;
