pub mod analytics;
pub mod health;
pub mod og;
pub mod posts;
