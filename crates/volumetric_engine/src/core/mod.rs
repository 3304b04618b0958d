//! Core pipeline services

pub mod config;
