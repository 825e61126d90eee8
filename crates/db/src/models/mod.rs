pub mod completion;
pub mod exercise_log;
pub mod profile;
pub mod route;
