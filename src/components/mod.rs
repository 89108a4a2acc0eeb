// ABOUTME: UI components for the terminal client: status header, terminal pane, help and layout

pub mod help;
pub mod layout;
pub mod status_header;
pub mod terminal_pane;

pub use help::HelpComponent;
pub use layout::LayoutComponent;
pub use status_header::StatusHeaderComponent;
pub use terminal_pane::TerminalPaneComponent;
