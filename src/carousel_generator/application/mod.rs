pub mod carousel_service;
pub mod error;
