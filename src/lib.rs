pub mod config;
pub mod display;
pub mod parser;
pub mod roster;
pub mod timetable;
pub mod web;
pub mod workspace;
