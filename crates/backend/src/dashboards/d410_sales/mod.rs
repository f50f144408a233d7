pub mod aggregator;
pub mod repository;
pub mod service;
