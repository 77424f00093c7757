// Presentation layer - Log-facing rendering of cycle results
pub mod summary;
