//! Metadata reading: values, tag names, extraction and privacy classification.

pub mod extract;
pub mod sensitivity;
pub mod tags;
pub mod value;

pub use extract::{
    DESCRIPTIVE_FIELDS, ImageDescriptor, MetadataSnapshot, RawTag, TagValue, extract,
};
pub use sensitivity::{Sensitivity, classify};
pub use tags::{Namespace, resolve};
pub use value::Value;
