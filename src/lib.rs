pub mod catalog;
pub mod config;
pub mod factoid;
pub mod facts;
pub mod image;
pub mod request;
pub mod server;
pub use dotenv::dotenv;
