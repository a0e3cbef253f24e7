//! Administrative backend for the anime/manga catalog: user collections,
//! tag-weighted recommendations and the admin activity log.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
