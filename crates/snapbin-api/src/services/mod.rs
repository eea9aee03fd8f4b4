pub mod short_link;
pub mod upload;
