pub mod prelevements;
pub mod prelevements_web;
pub mod system;
