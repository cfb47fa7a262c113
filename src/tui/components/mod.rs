//! Reusable screen components.

pub mod result_panel;
pub mod search_bar;
pub mod status_bar;
