pub mod classify;
pub mod engine;
pub mod events;
pub mod model;
pub mod parser;
pub mod supervisor;
