pub mod highlight;
pub mod output;

pub use output::{
    display_closed, display_connected, display_query, display_response, display_tool_call,
    display_tool_error, display_tool_result, extract_json, panel, print_result,
    truncate_for_display, Tone,
};
