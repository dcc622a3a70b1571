//! Clientes CRUD API Library
//!
//! HTTP JSON service for managing Cliente records, each referencing an
//! Endereco resolved through the ViaCEP postal-code lookup service and cached
//! in the database, deduplicated by CEP.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Database storage operations for clientes and enderecos.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models and request validation.
//! - `services`: Cliente business operations.
//! - `viacep`: ViaCEP lookup client.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod viacep;
