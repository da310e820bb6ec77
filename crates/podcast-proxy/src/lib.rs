//! `/api/podcast` feed relay.

pub mod proxy;
