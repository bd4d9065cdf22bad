pub mod client;
pub mod response;

pub use client::{HttpClient, HttpClientBuilder};
pub use response::ProbeResponse;
