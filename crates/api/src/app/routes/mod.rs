pub mod ai;
pub mod auth;
pub mod email;
pub mod invoices;
pub mod system;
