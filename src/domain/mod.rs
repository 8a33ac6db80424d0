// Domain module: models, value objects and the solver contract

pub mod error;
pub mod extract;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use error::*;
pub use extract::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
