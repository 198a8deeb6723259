//! Pipeline step implementations.

mod align;
mod clips;
mod concat;
mod narrate;

pub use align::AlignStep;
pub use clips::ClipsStep;
pub use concat::ConcatStep;
pub use narrate::NarrateStep;
