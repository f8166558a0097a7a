pub mod config;
pub mod db;
pub mod engine;
pub mod minecraft;
pub mod telegram;

#[cfg(test)]
mod test_support;
