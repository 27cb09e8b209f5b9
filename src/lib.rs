pub mod error;
pub mod rules;
pub mod roster;
pub mod headcount;
pub mod board;
pub mod view;
pub mod snapshot;
pub mod form;
pub mod display;
pub mod config;
pub mod web;

pub use error::{BoardError, BoardResult};
