pub mod cache;

pub mod client;

pub mod gateway;

pub mod history;

pub mod node;

pub mod test_helpers;

pub mod ui;

pub mod wallet;
