pub mod calculations;
pub mod db;
pub mod models;
pub mod services;

pub use db::repository::{PayrollRepository, RepositoryError};
pub use models::*;
