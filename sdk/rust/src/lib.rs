//! Client for the pubsub-bridge HTTP surface.

pub mod client;

pub use client::{BridgeClient, CallRequest, CallResponse, ClientError, PublishRequest};
