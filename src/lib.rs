#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use ow_utils as utils;
pub use ow_writer as writer;
