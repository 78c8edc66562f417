//! Terminal maize seed recommender for Nandi County.
//!
//! A Braille ward map with point and area selection, a shared location
//! context that every view reads, and mock environmental data behind a
//! provider trait.

pub mod app;
pub mod braille;
pub mod config;
pub mod context;
pub mod data;
pub mod environment;
pub mod geo;
pub mod geolocation;
pub mod hash;
pub mod map;
pub mod panel;
pub mod recommend;
pub mod selection;
pub mod session;
pub mod ui;
