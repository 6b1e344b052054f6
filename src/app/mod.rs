pub mod state;
pub mod transfer_service;
