pub mod config;
pub mod db;
pub mod error_convert;
pub mod health;
pub mod openapi;
pub mod rest;
pub mod telemetry;

pub mod auth;
pub mod rate_limit;
pub mod storage;

// Platform domain modules
pub mod chat;
pub mod geocode;
pub mod map;
pub mod profile_cache;
pub mod repo;
pub mod workflow;
