pub mod entities;
pub mod policies;
pub mod repositories;
pub mod value_objects;
