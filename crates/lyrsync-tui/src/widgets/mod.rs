pub mod progress_bar;
pub mod scrollable_list;
pub mod toast;
