pub mod doctors;
pub mod health;
pub mod recommendations;
