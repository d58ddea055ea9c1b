pub mod movie;
pub mod screening;
