pub mod ingest;
pub mod prices;
pub mod trigger;
