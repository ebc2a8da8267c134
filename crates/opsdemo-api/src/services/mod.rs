//! Business handlers. Deliberately trivial; everything interesting happens
//! in the request pipeline around them.

pub mod items;

pub use items::{Item, ItemStore};
