pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod payments;
pub mod repo;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod tokens;
pub mod uploads;
