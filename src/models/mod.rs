pub mod note;
pub mod partial_date;
pub mod value;

pub use note::*;
pub use partial_date::*;
pub use value::*;
