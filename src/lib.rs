//! Mini-game engines for the reconquest dashboard: the falling-item catch
//! game and the trivia quiz, plus the client for the remote rewards API.

pub mod api;
pub mod catalog;
pub mod compute;
pub mod config;
pub mod controller;
pub mod entities;
pub mod quiz;
pub mod reward;
pub mod timers;
