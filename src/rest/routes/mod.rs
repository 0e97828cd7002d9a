pub mod activities;
pub mod auth;
pub mod dashboard;
pub mod grades;
pub mod health;
pub mod questions;
pub mod schedules;
pub mod universities;
