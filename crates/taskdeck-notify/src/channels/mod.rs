pub mod agent;
pub mod qr;
