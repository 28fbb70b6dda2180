//! Matchdeck: a founder-investor matchmaking marketplace.
//!
//! Founders list products, investors browse the approved catalog, and every
//! exchange between the two sides passes through an admin review queue.
//! Staff broker introductions and calls; nothing crosses sides unreviewed.

pub mod app_config;
pub mod cache;
pub mod calls;
pub mod create_user;
pub mod db;
pub mod gate;
pub mod ip;
pub mod mediation;
pub mod middleware;
pub mod notifications;
pub mod orm;
pub mod products;
pub mod rate_limit;
pub mod session;
pub mod user;
pub mod verification;
pub mod web;
