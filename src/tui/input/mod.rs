//! Input field widgets.

pub mod text_input;
