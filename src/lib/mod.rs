pub mod appconfig;
pub mod controllers;
pub mod models;
pub mod pipedrive;
pub mod registry;
pub mod settings;
pub mod telemetry;
