pub mod client;

pub use client::BrokerMarketDataProvider;
