pub mod error;
pub mod order;
pub mod parser_log;
pub mod queue;
