//! H.264 NAL unit vocabulary shared by the `decode` crate and the `annexb` binary.

mod nal_unit;
mod nal_unit_type;

pub use nal_unit::{NalUnitHeader, START_CODE};
pub use nal_unit_type::NalUnitType;
