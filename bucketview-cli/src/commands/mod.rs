pub mod buckets;
pub mod index;
pub mod upload;
