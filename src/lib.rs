pub mod catalog;
pub mod features;
pub mod forecast;
pub mod utils;
