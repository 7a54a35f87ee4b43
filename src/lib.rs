pub mod circulation;
pub mod community_library_web_server;
pub mod core;
pub mod db;
pub mod models;
pub mod routes;
