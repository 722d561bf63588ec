//! Uploads a build artifact to S3 under a versioned key and points a
//! Lambda function at it.

pub mod app;
pub mod client;
pub mod conf;
pub mod error;
pub mod naming;
pub mod report;
pub mod service;
