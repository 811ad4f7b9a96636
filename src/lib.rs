pub mod config;
pub mod locale;
pub mod models;
pub mod practice;
pub mod questions;
pub mod streak;
pub mod untai;
pub mod untbot;
pub mod untdb;
