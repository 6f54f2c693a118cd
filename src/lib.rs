pub mod api;
pub mod config;
pub mod fetch;
pub mod model;
pub mod poll;
pub mod present;
pub mod reconcile;
pub mod render;
pub mod route;
pub mod view;
