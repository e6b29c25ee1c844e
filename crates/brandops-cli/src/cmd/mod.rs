pub mod actions;
pub mod apply;
pub mod completions;
pub mod session;
