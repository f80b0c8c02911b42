pub mod pointdata;

pub use pointdata::Entity as Pointdata;
