pub(crate) mod compose;
pub(crate) mod font;
pub(crate) mod wrap;
