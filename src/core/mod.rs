//! Core module for timeline data, gap collapse, and layout computation.

pub mod calculator;
pub mod collapse;
pub mod config;
pub mod error;
pub mod event;
pub mod label;
pub mod layout;
pub mod parser;
pub mod segments;
pub mod view;
