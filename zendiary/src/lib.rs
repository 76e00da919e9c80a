//! ZenDiary library
//!
//! This library exposes the diary core (entries, capture, feed, reminders
//! and sync) to the command-line front end and to tests.

pub mod app;
pub mod capability;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
