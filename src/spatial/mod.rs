pub mod transform;
pub mod wrench;
