pub mod debug;
pub mod engine;
pub mod errors;
pub mod fetcher;
pub mod ledger;
pub mod models;
pub mod output;
pub mod parser;
pub mod report;
pub mod sitemap;
pub mod utils;
