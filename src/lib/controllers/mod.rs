pub mod custodial;
pub mod listeners;
