pub mod encoding;
pub mod intake;
pub mod parser;
pub mod pipeline;
