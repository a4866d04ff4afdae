pub mod models;
pub mod ports;
pub mod text_splitter;
