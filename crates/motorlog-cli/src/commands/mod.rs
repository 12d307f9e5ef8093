pub mod backup;
pub mod export;
pub mod migrate;
pub mod status;
