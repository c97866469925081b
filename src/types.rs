pub mod number_or_string;
pub mod verse_edit;
pub mod verse_object;
pub mod verse_reference;
