pub mod pain008;
pub mod xml_writer;

pub use pain008::{PAIN_008_NAMESPACE, Pain008Renderer};
