pub mod file_picker;
pub mod track_table;
pub mod url_input;
