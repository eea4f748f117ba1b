// Tsume-shogi webhook bot: serves mating-problem images and reveals their answers on request.

pub mod answers;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod line;
pub mod metrics;
pub mod responder;
