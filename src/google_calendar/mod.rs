//! Tasks stored as events on a Google Calendar

pub mod client;
pub mod models;
pub mod time;
pub mod token;

pub use client::{GoogleCalendarClient, TaskCalendar};
pub use models::{NewTask, Task};
pub use token::TokenManager;
