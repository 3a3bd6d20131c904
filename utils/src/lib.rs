#![cfg_attr(feature = "strict", deny(warnings))]

pub mod constant_declarations;
pub mod serialization_utils;
