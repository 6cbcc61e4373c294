pub mod config;
pub mod console;
pub mod corpus;
pub mod error;
pub mod progress;
pub mod runner;
pub mod scheduler;
pub mod shutdown;
pub mod worker;
