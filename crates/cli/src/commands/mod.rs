//! # サブコマンド

pub mod certificates;
pub mod claim;
pub mod info;
pub mod keygen;
