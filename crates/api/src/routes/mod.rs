pub mod devices;
pub mod ui;
