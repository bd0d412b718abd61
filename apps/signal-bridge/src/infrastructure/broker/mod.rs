//! Broker adapters.

pub mod ig;
