//! Structural elements module

mod material;
mod member;
mod point;
mod section;
mod support;

pub use material::Material;
pub use member::{FailureMode, Member, MemberState};
pub use point::{Point, PointId};
pub use section::Section;
pub use support::Support;
