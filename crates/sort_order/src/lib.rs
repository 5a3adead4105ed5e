//! Note list sort order: a cycler over the sort settings and the commands that drive it.

mod commands;
mod cycler;
mod display;
mod input;

pub use commands::{
    register, switch_declaration, toggle_reverse_declaration, SWITCH_COMMAND,
    TOGGLE_REVERSE_COMMAND,
};
pub use cycler::{
    SortOrderCycler, SortOrderOutcome, DEFAULT_FIELDS, FIELD_KEY, PER_FIELD_REVERSAL_ENABLED_KEY,
    PER_FIELD_REVERSE_KEY, REVERSE_KEY,
};
pub use display::{field_icon, field_label, reverse_icon};
pub use input::SortOrderInput;
