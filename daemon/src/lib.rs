pub mod collector;
pub mod config;
pub mod console;
pub mod controller;
pub mod executor;
pub mod interactive;
pub mod load;
pub mod notifier;
pub mod profile;
