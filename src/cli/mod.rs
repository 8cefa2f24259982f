pub mod rate;
pub mod services;
pub mod setup;
pub mod ui;
