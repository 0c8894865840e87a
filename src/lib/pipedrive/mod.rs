//! Pipedrive CRM client and the create-person action.
pub mod client;
pub mod fields;
pub mod person;
pub mod props;

pub use client::{PipedriveAuth, PipedriveClient, PipedriveError};
pub use person::{create_person, CreatePersonProps, MarketingStatus, VisibleTo};
