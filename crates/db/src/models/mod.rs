pub mod parser_log;
pub mod queue;
