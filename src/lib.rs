pub mod app;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod handlers;
pub mod images;
pub mod mirror;
pub mod models;
pub mod render;
pub mod view;

#[cfg(test)]
mod tests;
