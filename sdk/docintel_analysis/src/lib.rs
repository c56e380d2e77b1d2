#![doc = include_str!("../README.md")]

pub mod analyze;
pub mod info;

#[cfg(test)]
pub(crate) use docintel_core::test_support as test_utils;
